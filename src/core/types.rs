use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::NumericError;

/// One of the two tracked symbols. The ratio is always `A / B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    A,
    B,
}

impl Symbol {
    pub fn other(self) -> Self {
        match self {
            Symbol::A => Symbol::B,
            Symbol::B => Symbol::A,
        }
    }
}

/// Exchange names for the two tracked symbols, e.g. `ORAIUSDT` / `OCHUSDT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPair {
    pub a: String,
    pub b: String,
}

impl SymbolPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::A => &self.a,
            Symbol::B => &self.b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolPrice {
    pub symbol: Symbol,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

/// Latest unmatched prices for A and B, combined once both were seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPricePair {
    pub datetime: DateTime<Utc>,
    pub price_a: f64,
    pub price_b: f64,
    pub ratio: f64,
}

impl MatchedPricePair {
    pub fn new(datetime: DateTime<Utc>, price_a: f64, price_b: f64) -> Self {
        Self {
            datetime,
            price_a,
            price_b,
            ratio: price_a / price_b,
        }
    }

    /// The ratio, or the reason it can't be compared against a band.
    pub fn checked_ratio(&self) -> Result<f64, NumericError> {
        if self.price_b == 0.0 {
            return Err(NumericError::DivisionByZero {
                price_a: self.price_a,
                price_b: self.price_b,
            });
        }
        if !self.ratio.is_finite() {
            return Err(NumericError::NonFinite {
                price_a: self.price_a,
                price_b: self.price_b,
            });
        }
        Ok(self.ratio)
    }
}

impl fmt::Display for MatchedPricePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] A: {} B: {} ratio: {}",
            self.datetime.format("%Y-%m-%d %H:%M:%S"),
            self.price_a,
            self.price_b,
            self.ratio
        )
    }
}

/// Band a ratio has to stay inside. Inverted bands are allowed and simply
/// alert on every pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand {
    pub min: f64,
    pub max: f64,
}

impl ThresholdBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Violation is strict on both sides: a ratio equal to a bound is inside.
    pub fn is_violated_by(&self, ratio: f64) -> bool {
        ratio < self.min || ratio > self.max
    }
}
