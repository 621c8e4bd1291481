// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: frame builders, mocks, and assertion helpers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::protocol::{
    ClientKind, CommandKind, DataKind, EventKind, MessageKind, PermissionLevel,
};
use crate::state::ConnectionState;
use crate::suggest::SuggestionItem;
use crate::ui::{Ui, VideoPlayer};

/// One call made against a [`RecordingUi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    Append(String),
    Evict,
    Clear,
    Playing(Option<String>, Option<String>),
    Notice(String),
    OpenChat,
    OpenUrl(String),
    Suggestions(Vec<SuggestionItem>),
    Compose(String, usize),
    Connection(ConnectionState),
}

/// [`Ui`] that keeps a call log plus a model of the visible message list.
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub calls: Vec<UiCall>,
    /// Messages as the list would currently show them.
    pub messages: Vec<String>,
    pub notice: String,
    pub chat_open: bool,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened_urls(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                UiCall::OpenUrl(u) => Some(u.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_compose(&self) -> Option<(&str, usize)> {
        self.calls.iter().rev().find_map(|c| match c {
            UiCall::Compose(text, caret) => Some((text.as_str(), *caret)),
            _ => None,
        })
    }

    pub fn connection_states(&self) -> Vec<ConnectionState> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                UiCall::Connection(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl Ui for RecordingUi {
    fn append_message(&mut self, html: &str) {
        self.messages.push(html.to_owned());
        self.calls.push(UiCall::Append(html.to_owned()));
    }

    fn evict_oldest(&mut self) {
        if !self.messages.is_empty() {
            self.messages.remove(0);
        }
        self.calls.push(UiCall::Evict);
    }

    fn clear_messages(&mut self) {
        self.messages.clear();
        self.calls.push(UiCall::Clear);
    }

    fn set_playing(&mut self, title: Option<&str>, link: Option<&str>) {
        self.calls.push(UiCall::Playing(title.map(str::to_owned), link.map(str::to_owned)));
    }

    fn show_notice(&mut self, text: &str) {
        self.notice = text.to_owned();
        self.calls.push(UiCall::Notice(text.to_owned()));
    }

    fn open_chat(&mut self) {
        self.chat_open = true;
        self.calls.push(UiCall::OpenChat);
    }

    fn open_url(&mut self, path: &str) {
        self.calls.push(UiCall::OpenUrl(path.to_owned()));
    }

    fn show_suggestions(&mut self, items: &[SuggestionItem]) {
        self.calls.push(UiCall::Suggestions(items.to_vec()));
    }

    fn set_compose(&mut self, text: &str, caret: usize) {
        self.calls.push(UiCall::Compose(text.to_owned(), caret));
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        if state.is_terminal() {
            self.chat_open = false;
        }
        self.calls.push(UiCall::Connection(state));
    }
}

/// Video player that counts reloads.
#[derive(Debug, Default, Clone)]
pub struct MockPlayer {
    reinits: Arc<AtomicUsize>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reinits(&self) -> usize {
        self.reinits.load(Ordering::Relaxed)
    }
}

impl VideoPlayer for MockPlayer {
    fn reinit(&mut self) {
        self.reinits.fetch_add(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Inbound frame builders
// ---------------------------------------------------------------------------

fn frame(kind: DataKind, data: Value) -> String {
    json!({ "Type": i64::from(kind), "Data": data }).to_string()
}

pub fn chat_frame(from: &str, message: &str, kind: MessageKind, level: PermissionLevel) -> String {
    frame(
        DataKind::Chat,
        json!({
            "From": from,
            "Color": "#ff0000",
            "Message": message,
            "Type": i64::from(kind),
            "Level": i64::from(level),
        }),
    )
}

pub fn event_frame(kind: EventKind, user: &str) -> String {
    frame(
        DataKind::Event,
        json!({ "Event": i64::from(kind), "User": user, "Color": "#00ff00" }),
    )
}

pub fn command_frame(kind: CommandKind, args: &[&str]) -> String {
    frame(DataKind::Command, json!({ "Command": i64::from(kind), "Arguments": args }))
}

pub fn hidden_frame(kind: ClientKind, data: Value) -> String {
    frame(DataKind::Hidden, json!({ "Type": i64::from(kind), "Data": data }))
}

// ---------------------------------------------------------------------------
// In-process chat server
// ---------------------------------------------------------------------------

/// What the fake server saw from its client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Text(String),
    Closed,
}

enum Push {
    Text(String),
    Close,
}

/// Single-client WebSocket server that records inbound frames and sends
/// whatever the test pushes.
pub struct FakeServer {
    pub addr: SocketAddr,
    received_rx: mpsc::UnboundedReceiver<Received>,
    push_tx: mpsc::UnboundedSender<Push>,
}

/// Bind on an ephemeral port and serve the first client that connects.
pub async fn spawn_chat_server() -> anyhow::Result<FakeServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let (push_tx, mut push_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else { return };
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else { return };
        let (mut tx, mut rx) = ws.split();
        loop {
            tokio::select! {
                push = push_rx.recv() => match push {
                    Some(Push::Text(text)) => {
                        if tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Push::Close) | None => {
                        let _ = tx.send(Message::Close(None)).await;
                        break;
                    }
                },
                msg = rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(Received::Text(text.to_string()));
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        let _ = received_tx.send(Received::Closed);
                        break;
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    });

    Ok(FakeServer { addr, received_rx, push_tx })
}

impl FakeServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Send a text frame to the client.
    pub fn push(&self, text: impl Into<String>) -> anyhow::Result<()> {
        self.push_tx.send(Push::Text(text.into())).map_err(|_| anyhow::anyhow!("server gone"))
    }

    /// Close the socket from the server side.
    pub fn close(&self) -> anyhow::Result<()> {
        self.push_tx.send(Push::Close).map_err(|_| anyhow::anyhow!("server gone"))
    }

    pub async fn recv(&mut self, timeout: Duration) -> anyhow::Result<Received> {
        tokio::time::timeout(timeout, self.received_rx.recv())
            .await
            .map_err(|_| anyhow::anyhow!("server recv timeout"))?
            .ok_or_else(|| anyhow::anyhow!("server task ended"))
    }

    /// Next text frame from the client, parsed as JSON.
    pub async fn recv_json(&mut self, timeout: Duration) -> anyhow::Result<Value> {
        match self.recv(timeout).await? {
            Received::Text(text) => Ok(serde_json::from_str(&text)?),
            Received::Closed => anyhow::bail!("client closed"),
        }
    }

    /// Next JSON frame whose `Type` is not a keepalive ping.
    pub async fn recv_non_ping(&mut self, timeout: Duration) -> anyhow::Result<Value> {
        loop {
            let value = self.recv_json(timeout).await?;
            if value["Type"] != json!(i64::from(ClientKind::Ping)) {
                return Ok(value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

/// Convert a `Result` with a displayable error into `anyhow::Result`.
pub trait AnyhowExt<T> {
    fn anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::fmt::Display> AnyhowExt<T> for Result<T, E> {
    fn anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{e}"))
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
