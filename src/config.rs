//! Process configuration: environment variables (optionally from `.env`)
//! plus a JSON file with the initial threshold band.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::api::mexc::{ReconnectPolicy, StreamConfig, MEXC_WS_URL};
use crate::core::{SymbolPair, ThresholdBand};
use crate::error::ConfigError;
use crate::notify::telegram::TelegramConfig;

pub const DEFAULT_SYMBOL_A: &str = "ORAIUSDT";
pub const DEFAULT_SYMBOL_B: &str = "OCHUSDT";
pub const DEFAULT_THRESHOLDS_PATH: &str = "config.json";
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

/// On-disk shape of the thresholds file, e.g. `{"minLimit": 0.5, "maxLimit": 1.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsFile {
    pub min_limit: f64,
    pub max_limit: f64,
}

impl ThresholdsFile {
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn band(&self) -> ThresholdBand {
        ThresholdBand::new(self.min_limit, self.max_limit)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub stream: StreamConfig,
    pub telegram: TelegramConfig,
    pub thresholds_path: String,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let url = get("STREAM_URL_MEXC").unwrap_or_else(|| MEXC_WS_URL.to_string());
        let symbols = SymbolPair::new(
            get("SYMBOL_A").unwrap_or_else(|| DEFAULT_SYMBOL_A.to_string()),
            get("SYMBOL_B").unwrap_or_else(|| DEFAULT_SYMBOL_B.to_string()),
        );

        let delay_secs = match get("RECONNECT_DELAY_SECS") {
            Some(v) => parse_secs("RECONNECT_DELAY_SECS", &v)?,
            None => DEFAULT_RECONNECT_DELAY_SECS,
        };
        let reconnect = match get("RECONNECT_BACKOFF_MAX_SECS") {
            Some(v) => ReconnectPolicy::Backoff {
                initial: Duration::from_secs(delay_secs),
                max: Duration::from_secs(parse_secs("RECONNECT_BACKOFF_MAX_SECS", &v)?),
            },
            None => ReconnectPolicy::Fixed(Duration::from_secs(delay_secs)),
        };

        Ok(Self {
            stream: StreamConfig {
                url,
                symbols,
                reconnect,
            },
            telegram: TelegramConfig {
                bot_token: require("TELEGRAM_BOT_TOKEN")?,
                chat_id: require("TELEGRAM_CHAT_ID")?,
            },
            thresholds_path: get("THRESHOLDS_PATH")
                .unwrap_or_else(|| DEFAULT_THRESHOLDS_PATH.to_string()),
        })
    }

    pub fn load_thresholds(&self) -> Result<ThresholdBand, ConfigError> {
        ThresholdsFile::load(&self.thresholds_path).map(|file| file.band())
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
