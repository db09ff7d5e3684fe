use log::{error, info, warn};
use std::sync::{Arc, PoisonError, RwLock};

use super::types::{MatchedPricePair, ThresholdBand};
use crate::error::NumericError;
use crate::notify::NotificationSink;

/// Handle to the threshold band shared by the alert engine (reader) and the
/// control surface (writer). Every update swaps the whole band under the lock.
#[derive(Debug, Clone)]
pub struct SharedThresholds {
    band: Arc<RwLock<ThresholdBand>>,
}

impl SharedThresholds {
    pub fn new(band: ThresholdBand) -> Self {
        Self {
            band: Arc::new(RwLock::new(band)),
        }
    }

    pub fn get(&self) -> ThresholdBand {
        *self.band.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn replace(&self, band: ThresholdBand) {
        *self.band.write().unwrap_or_else(PoisonError::into_inner) = band;
    }

    pub fn set_min(&self, min: f64) -> ThresholdBand {
        self.update(|band| ThresholdBand { min, ..band })
    }

    pub fn set_max(&self, max: f64) -> ThresholdBand {
        self.update(|band| ThresholdBand { max, ..band })
    }

    fn update(&self, f: impl FnOnce(ThresholdBand) -> ThresholdBand) -> ThresholdBand {
        let mut guard = self.band.write().unwrap_or_else(PoisonError::into_inner);
        let next = f(*guard);
        *guard = next;
        next
    }
}

/// Append-only, in-memory history of matched pairs in arrival order.
#[derive(Debug, Default)]
pub struct PriceLog {
    entries: Vec<MatchedPricePair>,
}

impl PriceLog {
    pub fn push(&mut self, pair: MatchedPricePair) {
        self.entries.push(pair);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MatchedPricePair> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchedPricePair> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    InBand(f64),
    /// Out of band; a notification was issued (delivery is not guaranteed).
    Alerted(f64),
    Skipped(NumericError),
}

pub fn alert_text(ratio: f64) -> String {
    format!("ratio out of bounds: {}", ratio)
}

pub struct AlertEngine {
    thresholds: SharedThresholds,
    sink: Arc<dyn NotificationSink>,
    log: PriceLog,
}

impl AlertEngine {
    pub fn new(thresholds: SharedThresholds, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            thresholds,
            sink,
            log: PriceLog::default(),
        }
    }

    /// Returns the ratio when it lies outside `band`, `None` when inside.
    pub fn evaluate(
        pair: &MatchedPricePair,
        band: &ThresholdBand,
    ) -> Result<Option<f64>, NumericError> {
        let ratio = pair.checked_ratio()?;
        Ok(band.is_violated_by(ratio).then_some(ratio))
    }

    /// Logs the pair, checks it against the current band and notifies on a
    /// violation. Never fails: numeric and delivery problems are logged.
    pub async fn process(&mut self, pair: MatchedPricePair) -> Verdict {
        self.log.push(pair);
        info!("{}", pair);

        let band = self.thresholds.get();
        match Self::evaluate(&pair, &band) {
            Ok(None) => Verdict::InBand(pair.ratio),
            Ok(Some(ratio)) => {
                warn!(
                    "Ratio {} outside band [{}, {}]",
                    ratio, band.min, band.max
                );
                if let Err(e) = self.sink.send(&alert_text(ratio)).await {
                    error!("Failed to send alert for ratio {}: {}", ratio, e);
                }
                Verdict::Alerted(ratio)
            }
            Err(e) => {
                warn!("Skipping evaluation: {}", e);
                Verdict::Skipped(e)
            }
        }
    }

    pub fn log(&self) -> &PriceLog {
        &self.log
    }

    pub fn thresholds(&self) -> &SharedThresholds {
        &self.thresholds
    }
}
