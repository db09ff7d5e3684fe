use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::types::DealsChannels;
use crate::core::{PricePipeline, SymbolPair};
use crate::error::TransportError;

pub const MEXC_WS_URL: &str = "wss://wbs.mexc.com/ws";

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// How long to wait in `Closed` before the next attempt. Neither variant
/// ever gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Fixed(Duration),
    /// `initial * 2^failures`, capped at `max`. Reset once a connection opens.
    Backoff { initial: Duration, max: Duration },
}

impl ReconnectPolicy {
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            ReconnectPolicy::Fixed(delay) => delay,
            ReconnectPolicy::Backoff { initial, max } => {
                let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
                initial.checked_mul(factor).unwrap_or(max).min(max)
            }
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Fixed(DEFAULT_RECONNECT_DELAY)
    }
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    pub symbols: SymbolPair,
    pub reconnect: ReconnectPolicy,
}

/// Why a session ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    RemoteClosed,
    Cancelled,
}

/// Single live connection to the deals feed, reconnecting forever.
pub struct StreamConnection {
    config: StreamConfig,
    channels: DealsChannels,
    state: watch::Sender<ConnectionState>,
}

impl StreamConnection {
    pub fn new(config: StreamConfig) -> Self {
        let channels = DealsChannels::new(&config.symbols);
        let (state, _) = watch::channel(ConnectionState::Closed);
        Self {
            config,
            channels,
            state,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!("Connection state {:?} -> {:?}", prev, next);
        }
    }

    /// Connect, stream, reconnect, until `cancel` fires. Attempts are strictly
    /// sequential, so there is never more than one connection in flight.
    pub async fn run(&self, pipeline: &mut PricePipeline, cancel: CancellationToken) {
        let mut failures: u32 = 0;

        loop {
            self.set_state(ConnectionState::Connecting);
            info!("Connecting to MEXC WebSocket: {}", self.config.url);

            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                result = connect_async(self.config.url.as_str()) => result,
            };

            match connected {
                Ok((ws_stream, _)) => {
                    self.set_state(ConnectionState::Open);
                    info!("Successfully connected to WebSocket");
                    failures = 0;

                    match self.session(ws_stream, pipeline, &cancel).await {
                        Ok(SessionEnd::Cancelled) => break,
                        Ok(SessionEnd::RemoteClosed) => info!("WebSocket connection closed"),
                        Err(e) => error!("WebSocket error: {}", e),
                    }
                }
                Err(e) => {
                    error!("Connection error: {}", TransportError::from(e));
                }
            }

            self.set_state(ConnectionState::Closed);
            let delay = self.config.reconnect.delay(failures);
            failures = failures.saturating_add(1);
            info!("Reconnecting in {:?}", delay);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Closed);
        info!("Stream connection stopped");
    }

    async fn session(
        &self,
        ws_stream: WsStream,
        pipeline: &mut PricePipeline,
        cancel: &CancellationToken,
    ) -> Result<SessionEnd, TransportError> {
        let (mut write, mut read) = ws_stream.split();
        self.subscribe(&mut write).await?;

        loop {
            let message = tokio::select! {
                // dropping the stream tears the socket down, no close handshake
                _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
                message = read.next() => message,
            };

            match message {
                Some(Ok(Message::Text(text))) => self.handle_frame(&text, pipeline).await,
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        warn!("Failed to send Pong: {}", e);
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::RemoteClosed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn subscribe(&self, write: &mut WsSink) -> Result<(), TransportError> {
        let request = serde_json::to_string(&self.channels.subscription())
            .map_err(|e| TransportError::Subscribe(e.to_string()))?;
        write.send(Message::Text(request)).await?;
        info!(
            "Subscribed to {} and {}",
            self.config.symbols.a, self.config.symbols.b
        );
        Ok(())
    }

    async fn handle_frame(&self, text: &str, pipeline: &mut PricePipeline) {
        match self.channels.decode(text) {
            Ok(Some((symbol, price))) => {
                pipeline.observe(symbol, price).await;
            }
            Ok(None) => debug!("Ignoring frame: {}", text),
            Err(e) => warn!("Failed to parse frame: {}", e),
        }
    }
}
