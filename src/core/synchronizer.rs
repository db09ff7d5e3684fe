use chrono::{DateTime, Utc};

use super::types::{MatchedPricePair, Symbol, SymbolPrice};

/// Latest unmatched price per symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBufferState {
    pub buffer_a: Option<SymbolPrice>,
    pub buffer_b: Option<SymbolPrice>,
}

impl PriceBufferState {
    pub fn get(&self, symbol: Symbol) -> Option<&SymbolPrice> {
        match symbol {
            Symbol::A => self.buffer_a.as_ref(),
            Symbol::B => self.buffer_b.as_ref(),
        }
    }

    fn slot(&mut self, symbol: Symbol) -> &mut Option<SymbolPrice> {
        match symbol {
            Symbol::A => &mut self.buffer_a,
            Symbol::B => &mut self.buffer_b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer_a.is_none() && self.buffer_b.is_none()
    }

    fn clear(&mut self) {
        self.buffer_a = None;
        self.buffer_b = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Same price as the one already buffered for the symbol.
    Duplicate,
    /// Stored, still waiting for the other symbol.
    Buffered,
    Matched(MatchedPricePair),
}

/// Pairs up asynchronous per-symbol prices. Latest price wins; a pair is
/// emitted as soon as both buffers hold a value, then both are cleared.
///
/// Owned by the frame-processing task only, so no locking.
#[derive(Debug, Default)]
pub struct PriceSynchronizer {
    state: PriceBufferState,
}

impl PriceSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, symbol: Symbol, price: f64) -> Observation {
        self.observe_at(symbol, price, Utc::now())
    }

    pub fn observe_at(
        &mut self,
        symbol: Symbol,
        price: f64,
        observed_at: DateTime<Utc>,
    ) -> Observation {
        if let Some(buffered) = self.state.get(symbol) {
            if buffered.price == price {
                return Observation::Duplicate;
            }
        }

        *self.state.slot(symbol) = Some(SymbolPrice {
            symbol,
            price,
            observed_at,
        });

        let (a, b) = match (self.state.buffer_a, self.state.buffer_b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Observation::Buffered,
        };

        self.state.clear();
        Observation::Matched(MatchedPricePair::new(observed_at, a.price, b.price))
    }

    pub fn state(&self) -> &PriceBufferState {
        &self.state
    }
}
