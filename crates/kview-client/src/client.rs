//! Publisher WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use kview_proto::ClusterSnapshot;

use crate::bus::{EventBus, HandlerError, HandlerId};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{ClientEvent, EventCategory};
use crate::state::{AtomicConnectionState, ConnectionState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle to the live connection task.
struct ConnectionHandle {
    outbound: mpsc::Sender<String>,
    shutdown: oneshot::Sender<()>,
}

/// Client that owns one persistent connection to the snapshot publisher.
///
/// All three operations return immediately; outcomes are reported through
/// the event categories of [`EventCategory`]. The connection task decodes
/// each inbound text frame into a [`ClusterSnapshot`] and dispatches exactly
/// one `message` event per well-formed frame. An undecodable frame raises a
/// Parse error and leaves the connection open; a transport failure raises a
/// Transport error followed by a `disconnect` event.
pub struct StreamClient {
    config: ClientConfig,
    state: Arc<AtomicConnectionState>,
    bus: Arc<EventBus>,
    conn: Arc<Mutex<Option<ConnectionHandle>>>,
}

impl StreamClient {
    /// Create a client for the configured publisher. No connection is made
    /// until [`Self::connect`] is called.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: Arc::new(AtomicConnectionState::new(ConnectionState::Idle)),
            bus: Arc::new(EventBus::new()),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Open the connection. Idempotent while a connection is active: calls
    /// made during Connecting or Open change nothing and spawn no socket.
    pub fn connect(&self) {
        if !self.state.try_begin_connect() {
            debug!("connect ignored, connection already active");
            return;
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *self.conn.lock() = Some(ConnectionHandle {
            outbound: outbound_tx,
            shutdown: shutdown_tx,
        });

        let url = self.config.url.clone();
        let connect_timeout = self.config.connect_timeout;
        let state = Arc::clone(&self.state);
        let bus = Arc::clone(&self.bus);
        let conn = Arc::clone(&self.conn);
        tokio::spawn(async move {
            run_connection(url, connect_timeout, state, bus, conn, outbound_rx, shutdown_rx).await;
        });
    }

    /// Close the connection if one is active; no-op otherwise. An in-flight
    /// handshake is abandoned. The `disconnect` event for this connection
    /// instance is the last event it produces.
    pub fn disconnect(&self) {
        if let Some(handle) = self.conn.lock().take() {
            let _ = handle.shutdown.send(());
        }
    }

    /// Serialize `payload` and transmit it if the connection is Open.
    ///
    /// Never fails from the caller's perspective: while not Open the payload
    /// is dropped and a `NotConnected` error event is raised instead.
    pub fn send<T: Serialize>(&self, payload: &T) {
        if self.state.load() != ConnectionState::Open {
            self.bus.emit(&ClientEvent::Error(ClientError::NotConnected));
            return;
        }
        let outbound = self.conn.lock().as_ref().map(|h| h.outbound.clone());
        let Some(outbound) = outbound else {
            self.bus.emit(&ClientEvent::Error(ClientError::NotConnected));
            return;
        };

        match serde_json::to_string(payload) {
            Ok(json) => {
                if outbound.try_send(json).is_err() {
                    warn!("outbound channel full, dropping payload");
                }
            }
            Err(error) => warn!(%error, "failed to encode outbound payload"),
        }
    }

    /// Register `handler` for `category`. Handlers run synchronously in
    /// registration order on each dispatch.
    pub fn on<F>(&self, category: EventCategory, handler: F) -> HandlerId
    where
        F: FnMut(&ClientEvent) -> Result<(), HandlerError> + Send + 'static,
    {
        self.bus.on(category, handler)
    }

    /// Remove a registration made with [`Self::on`].
    pub fn off(&self, category: EventCategory, id: HandlerId) -> bool {
        self.bus.off(category, id)
    }
}

async fn run_connection(
    url: String,
    connect_timeout: Option<Duration>,
    state: Arc<AtomicConnectionState>,
    bus: Arc<EventBus>,
    conn: Arc<Mutex<Option<ConnectionHandle>>>,
    mut outbound_rx: mpsc::Receiver<String>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let handshake = handshake(&url, connect_timeout);
    tokio::pin!(handshake);

    let ws = tokio::select! {
        // disconnect() during the handshake discards interest in it.
        _ = &mut shutdown_rx => {
            finish_closed(&state, &bus, &conn);
            return;
        }
        result = &mut handshake => match result {
            Ok(ws) => ws,
            Err(detail) => {
                state.store(ConnectionState::Errored);
                bus.emit(&ClientEvent::Error(ClientError::Transport(detail)));
                finish_closed(&state, &bus, &conn);
                return;
            }
        }
    };

    state.store(ConnectionState::Open);
    bus.emit(&ClientEvent::Connected);

    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                let _ = write.close().await;
                finish_closed(&state, &bus, &conn);
                return;
            }
            outbound = outbound_rx.recv() => match outbound {
                Some(json) => {
                    if let Err(e) = write.send(Message::Text(json)).await {
                        state.store(ConnectionState::Errored);
                        bus.emit(&ClientEvent::Error(ClientError::Transport(e.to_string())));
                        finish_closed(&state, &bus, &conn);
                        return;
                    }
                }
                // All senders gone means the handle was dropped; treat as an
                // explicit close.
                None => {
                    let _ = write.close().await;
                    finish_closed(&state, &bus, &conn);
                    return;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match ClusterSnapshot::from_frame(&text) {
                    Ok(snapshot) => bus.emit(&ClientEvent::Message(Arc::new(snapshot))),
                    Err(error) => {
                        // The previous snapshot stays valid; keep reading.
                        warn!(%error, "dropping undecodable frame");
                        bus.emit(&ClientEvent::Error(ClientError::Parse(error.to_string())));
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    finish_closed(&state, &bus, &conn);
                    return;
                }
                Some(Ok(_)) => {} // ping/pong/binary
                Some(Err(e)) => {
                    state.store(ConnectionState::Errored);
                    bus.emit(&ClientEvent::Error(ClientError::Transport(e.to_string())));
                    finish_closed(&state, &bus, &conn);
                    return;
                }
            }
        }
    }
}

async fn handshake(url: &str, limit: Option<Duration>) -> Result<WsStream, String> {
    let connect = tokio_tungstenite::connect_async(url);
    match limit {
        Some(limit) => match tokio::time::timeout(limit, connect).await {
            Ok(Ok((ws, _))) => Ok(ws),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("handshake timed out after {limit:?}")),
        },
        None => connect.await.map(|(ws, _)| ws).map_err(|e| e.to_string()),
    }
}

/// Common tail of every connection teardown path.
///
/// The state must read Closed before the disconnect event dispatches so a
/// handler reacting to it can immediately call `connect()` again.
fn finish_closed(
    state: &AtomicConnectionState,
    bus: &EventBus,
    conn: &Mutex<Option<ConnectionHandle>>,
) {
    conn.lock().take();
    state.store(ConnectionState::Closed);
    bus.emit(&ClientEvent::Disconnected);
}
