//! Operator channel capabilities: sending text out and receiving commands in.

pub mod queue;
pub mod telegram;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Delivers alert text to the operator.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}

/// A text message received on the operator channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Source of operator commands. Replies go back to the chat a message came from.
#[async_trait]
pub trait CommandSource: Send {
    /// Wait for the next message. `None` means the channel is gone for good.
    async fn next_message(&mut self) -> Option<OperatorMessage>;

    async fn reply(&self, to: &OperatorMessage, text: &str) -> Result<(), DeliveryError>;
}
