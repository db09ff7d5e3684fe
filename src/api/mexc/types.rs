use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Symbol, SymbolPair};
use crate::error::DecodeError;

/// Public trade ("deals") channel prefix; the symbol name is appended.
pub const DEALS_CHANNEL_PREFIX: &str = "spot@public.deals.v3.api@";

#[derive(Debug, Serialize)]
pub struct SubscriptionRequest {
    pub method: &'static str,
    pub params: Vec<String>,
}

/// Envelope of every inbound frame. Acks and pongs have no `c`/`d`.
#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(rename = "c")]
    channel: Option<String>,
    #[serde(rename = "d")]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DealsData {
    #[serde(default)]
    deals: Vec<Deal>,
}

#[derive(Debug, Deserialize)]
struct Deal {
    #[serde(rename = "p")]
    price: Option<PriceField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Text(String),
    Number(f64),
}

impl PriceField {
    fn as_f64(&self) -> Option<f64> {
        let price = match self {
            PriceField::Text(s) => s.trim().parse::<f64>().ok()?,
            PriceField::Number(n) => *n,
        };
        price.is_finite().then_some(price)
    }
}

/// Maps the two deals channels to symbols and back.
#[derive(Debug, Clone)]
pub struct DealsChannels {
    a: String,
    b: String,
}

impl DealsChannels {
    pub fn new(symbols: &SymbolPair) -> Self {
        Self {
            a: format!("{}{}", DEALS_CHANNEL_PREFIX, symbols.a),
            b: format!("{}{}", DEALS_CHANNEL_PREFIX, symbols.b),
        }
    }

    pub fn channel(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::A => &self.a,
            Symbol::B => &self.b,
        }
    }

    pub fn symbol(&self, channel: &str) -> Option<Symbol> {
        if channel == self.a {
            Some(Symbol::A)
        } else if channel == self.b {
            Some(Symbol::B)
        } else {
            None
        }
    }

    pub fn subscription(&self) -> SubscriptionRequest {
        SubscriptionRequest {
            method: "SUBSCRIPTION",
            params: vec![self.a.clone(), self.b.clone()],
        }
    }

    /// Extracts the leading deal price from a frame on one of our channels.
    ///
    /// Only invalid JSON is an error. Frames for other channels, and empty
    /// or malformed payloads on ours, yield `Ok(None)`.
    pub fn decode(&self, text: &str) -> Result<Option<(Symbol, f64)>, DecodeError> {
        let frame: Frame = serde_json::from_str(text)?;

        let Some(symbol) = frame.channel.as_deref().and_then(|c| self.symbol(c)) else {
            return Ok(None);
        };
        let Some(data) = frame.data else {
            return Ok(None);
        };
        let Ok(deals) = serde_json::from_value::<DealsData>(data) else {
            return Ok(None);
        };

        let price = deals
            .deals
            .first()
            .and_then(|deal| deal.price.as_ref())
            .and_then(PriceField::as_f64);

        Ok(price.map(|p| (symbol, p)))
    }
}
