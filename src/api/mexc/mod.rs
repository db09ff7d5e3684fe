//! MEXC spot deals feed.

pub mod types;
pub mod ws;

pub use types::{DealsChannels, DEALS_CHANNEL_PREFIX};
pub use ws::{ConnectionState, ReconnectPolicy, StreamConfig, StreamConnection, MEXC_WS_URL};
