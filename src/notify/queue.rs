use async_trait::async_trait;
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::NotificationSink;
use crate::error::DeliveryError;

/// Fire-and-forget wrapper around a sink. `send` only enqueues; a background
/// task delivers in issue order and logs failures. Nothing is retried.
pub struct QueuedSink {
    tx: mpsc::UnboundedSender<String>,
}

impl QueuedSink {
    pub fn spawn(inner: Arc<dyn NotificationSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let handle = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                match inner.send(&text).await {
                    Ok(()) => debug!("Delivered notification: {}", text),
                    Err(e) => error!("Failed to deliver notification '{}': {}", text, e),
                }
            }
            debug!("Notification queue drained");
        });

        (Self { tx }, handle)
    }
}

#[async_trait]
impl NotificationSink for QueuedSink {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        self.tx
            .send(text.to_string())
            .map_err(|_| DeliveryError::QueueClosed)
    }
}
