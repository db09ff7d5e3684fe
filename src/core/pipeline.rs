use log::debug;

use super::alerts::{AlertEngine, Verdict};
use super::synchronizer::{Observation, PriceSynchronizer};
use super::types::Symbol;

/// State of the frame-processing task: decoded prices go in, matched pairs
/// are evaluated in arrival order.
pub struct PricePipeline {
    synchronizer: PriceSynchronizer,
    engine: AlertEngine,
}

impl PricePipeline {
    pub fn new(engine: AlertEngine) -> Self {
        Self {
            synchronizer: PriceSynchronizer::new(),
            engine,
        }
    }

    /// Returns the verdict when this observation completed a pair.
    pub async fn observe(&mut self, symbol: Symbol, price: f64) -> Option<Verdict> {
        match self.synchronizer.observe(symbol, price) {
            Observation::Matched(pair) => Some(self.engine.process(pair).await),
            Observation::Duplicate => {
                debug!("Duplicate price {} for {:?}", price, symbol);
                None
            }
            Observation::Buffered => None,
        }
    }

    pub fn synchronizer(&self) -> &PriceSynchronizer {
        &self.synchronizer
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }
}
