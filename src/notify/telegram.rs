//! Telegram Bot API operator channel.
//!
//! Alerts go to the configured chat; commands are long-polled with
//! `getUpdates` and replies go back to whichever chat sent them.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::{CommandSource, NotificationSink, OperatorMessage};
use crate::error::DeliveryError;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Seconds a `getUpdates` call may block server-side.
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Where alerts are sent. Numeric id or `@channelusername`.
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

pub struct TelegramBot {
    config: TelegramConfig,
    base_url: String,
    http_client: Client,
}

impl TelegramBot {
    pub fn new(config: TelegramConfig) -> Result<Self, DeliveryError> {
        Self::with_base_url(config, TELEGRAM_API_URL)
    }

    pub fn with_base_url(config: TelegramConfig, base_url: &str) -> Result<Self, DeliveryError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;
        Ok(Self {
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.config.bot_token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T, DeliveryError> {
        let response: ApiResponse<T> = self
            .http_client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(DeliveryError::Rejected(
                response
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            )),
        }
    }

    pub async fn send_message(&self, chat_id: Value, text: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
        });
        self.call::<Value>("sendMessage", payload).await?;
        Ok(())
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, DeliveryError> {
        let payload = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", payload).await
    }
}

#[async_trait]
impl NotificationSink for TelegramBot {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        self.send_message(json!(self.config.chat_id), text).await
    }
}

/// Long-polling command source over a shared bot.
pub struct TelegramCommands {
    bot: Arc<TelegramBot>,
    offset: i64,
    pending: VecDeque<OperatorMessage>,
}

impl TelegramCommands {
    pub fn new(bot: Arc<TelegramBot>) -> Self {
        Self {
            bot,
            offset: 0,
            pending: VecDeque::new(),
        }
    }

    /// Queues text messages and advances the offset past every update seen.
    fn absorb(&mut self, updates: Vec<Update>) {
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            if let Some(text) = message.text {
                self.pending.push_back(OperatorMessage {
                    chat_id: message.chat.id,
                    text,
                });
            }
        }
    }
}

#[async_trait]
impl CommandSource for TelegramCommands {
    async fn next_message(&mut self) -> Option<OperatorMessage> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(message);
            }

            match self.bot.get_updates(self.offset).await {
                Ok(updates) => {
                    debug!("Received {} Telegram updates", updates.len());
                    self.absorb(updates);
                }
                Err(e) => {
                    warn!("Telegram poll failed: {}", e);
                    sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn reply(&self, to: &OperatorMessage, text: &str) -> Result<(), DeliveryError> {
        self.bot.send_message(json!(to.chat_id), text).await
    }
}
