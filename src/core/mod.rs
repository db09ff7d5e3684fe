pub mod alerts;
pub mod control;
pub mod pipeline;
pub mod synchronizer;
pub mod types;

pub use alerts::{AlertEngine, PriceLog, SharedThresholds, Verdict};
pub use control::ThresholdControlSurface;
pub use pipeline::PricePipeline;
pub use synchronizer::{Observation, PriceBufferState, PriceSynchronizer};
pub use types::{MatchedPricePair, Symbol, SymbolPair, SymbolPrice, ThresholdBand};
