use thiserror::Error;

/// Failure on the feed connection. Always recovered by reconnecting.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    Websocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to send subscription: {0}")]
    Subscribe(String),
}

/// An inbound frame that could not be parsed.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    #[error("division by zero price (a: {price_a}, b: {price_b})")]
    DivisionByZero { price_a: f64, price_b: f64 },

    #[error("non-finite ratio from prices (a: {price_a}, b: {price_b})")]
    NonFinite { price_a: f64, price_b: f64 },
}

/// A malformed operator command argument.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing value")]
    MissingArgument,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' must be a non-negative number")]
    Negative(String),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("operator channel rejected the message: {0}")]
    Rejected(String),

    #[error("delivery queue closed")]
    QueueClosed,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable not found: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to read thresholds file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse thresholds file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RatioWatchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
