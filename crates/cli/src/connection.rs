// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket lifecycle, outbound serialization, and keepalive.
//!
//! [`Connection::open`] spawns a driver task that owns the socket. The task
//! dials, reports every state change and inbound frame as a
//! [`ConnectionEvent`], and pings on a fixed interval while open. Closed and
//! errored connections stay down; there is no reconnect.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::protocol::{self, Envelope, OutgoingEnvelope};
use crate::state::ConnectionState;

/// Keepalive cadence. Chosen to stay under a typical 60s proxy idle timeout.
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(45);

/// Something the driver observed, in arrival order.
#[derive(Debug)]
pub enum ConnectionEvent {
    State(ConnectionState),
    Frame(Envelope),
    /// A text frame that failed to decode. The connection stays up.
    Malformed(ClientError),
}

/// Handle to a driver task. Dropping it closes the socket.
#[derive(Debug)]
pub struct Connection {
    id: String,
    state: Arc<AtomicU8>,
    outbound_tx: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl Connection {
    /// Start dialing `url`. Must be called inside a tokio runtime.
    ///
    /// Never fails directly: a dial failure arrives as
    /// `ConnectionEvent::State(Errored)` on the returned receiver.
    pub fn open(url: &str, keepalive: Duration) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        let id = uuid::Uuid::new_v4().to_string();
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting.to_u8()));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();

        let keepalive = if keepalive.is_zero() { DEFAULT_KEEPALIVE } else { keepalive };
        let driver = Driver {
            id: id.clone(),
            url: url.to_owned(),
            keepalive,
            state: Arc::clone(&state),
            outbound_rx,
            events_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(driver.run());

        (Self { id, state, outbound_tx, cancel }, events_rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Queue an envelope for the socket.
    pub fn send(&self, envelope: &OutgoingEnvelope) -> Result<(), ClientError> {
        if self.state() != ConnectionState::Open {
            return Err(ClientError::NotConnected);
        }
        let text = envelope.encode()?;
        if !envelope.is_keepalive() {
            debug!(conn = %self.id, kind = ?envelope.kind, "send");
        }
        self.outbound_tx.send(text).map_err(|_| ClientError::NotConnected)
    }

    /// Flush queued sends, then send a close frame and stop the keepalive.
    ///
    /// The driver reports `State(Closed)` once the close frame is out.
    pub fn close(&self) {
        advance(&self.state, ConnectionState::Closed);
        self.cancel.cancel();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Move to `next` if the transition is legal. Returns the resulting state.
fn advance(state: &AtomicU8, next: ConnectionState) -> ConnectionState {
    let mut current = state.load(Ordering::Acquire);
    loop {
        let from = ConnectionState::from_u8(current);
        if !from.can_transition_to(next) {
            return from;
        }
        match state.compare_exchange(current, next.to_u8(), Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

struct Driver {
    id: String,
    url: String,
    keepalive: Duration,
    state: Arc<AtomicU8>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    events_tx: mpsc::Sender<ConnectionEvent>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        let dialed = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.finish(ConnectionState::Closed).await;
                return;
            }
            res = tokio_tungstenite::connect_async(self.url.as_str()) => res,
        };

        let ws = match dialed {
            Ok((ws, _)) => ws,
            Err(e) => {
                warn!(conn = %self.id, url = %self.url, err = %e, "dial failed");
                self.finish(ConnectionState::Errored).await;
                return;
            }
        };

        if advance(&self.state, ConnectionState::Open) != ConnectionState::Open {
            // Closed by the user while the handshake was in flight.
            self.finish(ConnectionState::Closed).await;
            return;
        }
        info!(conn = %self.id, url = %self.url, "connected");
        self.emit(ConnectionEvent::State(ConnectionState::Open)).await;

        let (mut ws_tx, mut ws_rx) = ws.split();
        let end = self.pump(&mut ws_tx, &mut ws_rx).await;
        self.finish(end).await;
    }

    /// Shuttle frames until the socket ends. Returns the terminal state.
    async fn pump<WsTx, WsRx>(&mut self, ws_tx: &mut WsTx, ws_rx: &mut WsRx) -> ConnectionState
    where
        WsTx: SinkExt<Message> + Unpin,
        WsRx: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        let mut ping_interval = tokio::time::interval(self.keepalive);
        ping_interval.tick().await; // Consume the immediate first tick.

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    // Anything `send` accepted before the close still goes out.
                    while let Ok(text) = self.outbound_rx.try_recv() {
                        if let Err(e) = send_text(ws_tx, text).await {
                            warn!(conn = %self.id, err = %e, "flush before close failed");
                            return ConnectionState::Errored;
                        }
                    }
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return ConnectionState::Closed;
                }

                Some(text) = self.outbound_rx.recv() => {
                    if let Err(e) = send_text(ws_tx, text).await {
                        warn!(conn = %self.id, err = %e, "send failed");
                        return ConnectionState::Errored;
                    }
                }

                msg = ws_rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = match protocol::decode(text.as_str()) {
                            Ok(envelope) => ConnectionEvent::Frame(envelope),
                            Err(e) => {
                                warn!(conn = %self.id, err = %e, "malformed frame");
                                ConnectionEvent::Malformed(e)
                            }
                        };
                        self.emit(event).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(conn = %self.id, ?frame, "server closed");
                        return ConnectionState::Closed;
                    }
                    None => return ConnectionState::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn = %self.id, err = %e, "socket error");
                        return ConnectionState::Errored;
                    }
                },

                _ = ping_interval.tick() => {
                    let ping = OutgoingEnvelope::ping().encode();
                    match ping {
                        Ok(text) => {
                            if send_text(ws_tx, text).await.is_err() {
                                return ConnectionState::Errored;
                            }
                        }
                        Err(e) => warn!(conn = %self.id, err = %e, "keepalive encode failed"),
                    }
                }
            }
        }
    }

    /// Record the terminal state and report it exactly once.
    async fn finish(&mut self, end: ConnectionState) {
        let reached = advance(&self.state, end);
        let reported = if reached.is_terminal() { reached } else { end };
        info!(conn = %self.id, state = %reported, "disconnected");
        self.emit(ConnectionEvent::State(reported)).await;
    }

    async fn emit(&self, event: ConnectionEvent) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.events_tx.send(event).await;
    }
}

/// Send one text frame.
async fn send_text<S>(tx: &mut S, text: String) -> Result<(), ClientError>
where
    S: SinkExt<Message> + Unpin,
{
    tx.send(Message::Text(text.into()))
        .await
        .map_err(|_| ClientError::Transport("WebSocket send failed".to_owned()))
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
