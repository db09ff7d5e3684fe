//! Shared fixtures for integration tests: a scripted mock feed server and
//! fake operator-channel endpoints.

#![allow(dead_code)]

use async_trait::async_trait;
use ratiowatch::api::mexc::{ConnectionState, ReconnectPolicy, StreamConfig, StreamConnection};
use ratiowatch::core::{AlertEngine, PricePipeline, SharedThresholds, SymbolPair, ThresholdBand};
use ratiowatch::error::DeliveryError;
use ratiowatch::notify::{CommandSource, NotificationSink, OperatorMessage};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const SYMBOL_A: &str = "ORAIUSDT";
pub const SYMBOL_B: &str = "OCHUSDT";

pub fn symbols() -> SymbolPair {
    SymbolPair::new(SYMBOL_A, SYMBOL_B)
}

pub fn expected_subscription() -> String {
    format!(
        r#"{{"method":"SUBSCRIPTION","params":["spot@public.deals.v3.api@{}","spot@public.deals.v3.api@{}"]}}"#,
        SYMBOL_A, SYMBOL_B
    )
}

/// A deals frame as MEXC sends it, with a single trade.
pub fn deal_frame(symbol: &str, price: &str) -> String {
    format!(
        r#"{{"c":"spot@public.deals.v3.api@{sym}","d":{{"deals":[{{"S":1,"p":"{price}","t":1700000000000,"v":"1.5"}}],"e":"spot@public.deals.v3.api"}},"s":"{sym}","t":1700000000001}}"#,
        sym = symbol,
        price = price
    )
}

/// What the server does with the n-th accepted connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionScript {
    pub frames: Vec<String>,
    /// Send a close frame after the scripted frames instead of idling.
    pub close_after: bool,
}

impl ConnectionScript {
    pub fn open(frames: Vec<String>) -> Self {
        Self {
            frames,
            close_after: false,
        }
    }

    pub fn closing(frames: Vec<String>) -> Self {
        Self {
            frames,
            close_after: true,
        }
    }
}

/// Mock deals feed. Records every subscription request and when each
/// connection was accepted.
pub struct MockFeedServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    connected_at: Arc<Mutex<Vec<Instant>>>,
}

impl MockFeedServer {
    pub async fn start(scripts: Vec<ConnectionScript>) -> Self {
        Self::bind("127.0.0.1:0", scripts).await
    }

    pub async fn bind(addr: &str, scripts: Vec<ConnectionScript>) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let connected_at = Arc::new(Mutex::new(Vec::new()));

        tokio::spawn({
            let shutdown = shutdown.clone();
            let subscriptions = subscriptions.clone();
            let connected_at = connected_at.clone();
            async move {
                loop {
                    tokio::select! {
                        result = listener.accept() => {
                            let Ok((stream, _)) = result else { break };
                            let index = {
                                let mut times = connected_at.lock().unwrap();
                                times.push(Instant::now());
                                times.len() - 1
                            };
                            let script = scripts.get(index).cloned().unwrap_or_default();
                            tokio::spawn(Self::handle_connection(
                                stream,
                                script,
                                subscriptions.clone(),
                                shutdown.clone(),
                            ));
                        }
                        _ = shutdown.notified() => break,
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            subscriptions,
            connected_at,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        script: ConnectionScript,
        subscriptions: Arc<Mutex<Vec<String>>>,
        shutdown: Arc<Notify>,
    ) {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let Ok(ws_stream) = accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws_stream.split();

        // the client subscribes before anything else
        match read.next().await {
            Some(Ok(Message::Text(text))) => subscriptions.lock().unwrap().push(text),
            _ => return,
        }

        for frame in script.frames {
            if write.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }

        if script.close_after {
            let _ = write.send(Message::Close(None)).await;
            return;
        }

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(msg)) if msg.is_close() => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                },
                _ = shutdown.notified() => break,
            }
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn connection_times(&self) -> Vec<Instant> {
        self.connected_at.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connected_at.lock().unwrap().len()
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockFeedServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sink that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Command source that hands out a fixed list of messages, then waits
/// forever. Replies are recorded with the chat they were addressed to.
pub struct ScriptedCommands {
    messages: VecDeque<OperatorMessage>,
    replies: Arc<Mutex<Vec<(i64, String)>>>,
}

impl ScriptedCommands {
    pub fn new(chat_id: i64, texts: &[&str]) -> (Self, Arc<Mutex<Vec<(i64, String)>>>) {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let messages = texts
            .iter()
            .map(|text| OperatorMessage {
                chat_id,
                text: text.to_string(),
            })
            .collect();
        (
            Self {
                messages,
                replies: replies.clone(),
            },
            replies,
        )
    }
}

#[async_trait]
impl CommandSource for ScriptedCommands {
    async fn next_message(&mut self) -> Option<OperatorMessage> {
        match self.messages.pop_front() {
            Some(message) => Some(message),
            None => std::future::pending().await,
        }
    }

    async fn reply(&self, to: &OperatorMessage, text: &str) -> Result<(), DeliveryError> {
        self.replies
            .lock()
            .unwrap()
            .push((to.chat_id, text.to_string()));
        Ok(())
    }
}

pub fn pipeline(band: ThresholdBand, sink: Arc<RecordingSink>) -> (PricePipeline, SharedThresholds) {
    let thresholds = SharedThresholds::new(band);
    let engine = AlertEngine::new(thresholds.clone(), sink);
    (PricePipeline::new(engine), thresholds)
}

/// A stream connection running on its own task.
pub struct RunningStream {
    pub state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    handle: JoinHandle<PricePipeline>,
}

impl RunningStream {
    pub fn spawn(url: String, reconnect: ReconnectPolicy, mut pipeline: PricePipeline) -> Self {
        let connection = StreamConnection::new(StreamConfig {
            url,
            symbols: symbols(),
            reconnect,
        });
        let state = connection.subscribe_state();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                connection.run(&mut pipeline, cancel).await;
                pipeline
            }
        });

        Self {
            state,
            cancel,
            handle,
        }
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Cancels and hands back the pipeline. Panics if shutdown takes over 2s.
    pub async fn stop(self) -> PricePipeline {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), self.handle)
            .await
            .expect("stream connection did not stop")
            .expect("stream task panicked")
    }
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
