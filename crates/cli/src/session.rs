// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session loop: wires the connection, the interpreter, the suggestion
//! engine, and the UI collaborator together on one task.
//!
//! Everything runs in arrival order on the task that calls [`Session::run`].
//! Only the connection driver lives elsewhere, and it talks to the session
//! exclusively through [`ConnectionEvent`]s.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::color::{is_valid_color, random_color};
use crate::connection::{Connection, ConnectionEvent};
use crate::error::ClientError;
use crate::interpreter::{Context, Interpreter};
use crate::prefs::{PreferenceStore, COLOR_KEY, TIMESTAMP_KEY};
use crate::protocol::OutgoingEnvelope;
use crate::render;
use crate::state::{ClientState, ConnectionState};
use crate::suggest::{Key, KeyOutcome, SuggestionEngine};
use crate::ui::Ui;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 36;

/// Shown once the connection is gone for good.
pub const DISCONNECTED_NOTICE: &str =
    "The connection to the server has closed. Restart the client to connect again.";

/// How long a quit waits for queued messages and the close frame to go out.
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

static NAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z_-]+$").ok());

/// Whether `name` is acceptable as a chat name.
pub fn is_valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len)
        && NAME_RE.as_ref().is_some_and(|re| re.is_match(name))
}

/// Input from the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Join { name: String },
    Send(String),
    ContentChanged { text: String, caret: usize },
    KeyDown { key: Key, ctrl: bool },
    SetColor(String),
    SetTimestamps(bool),
    RequestUsers,
    Quit,
}

/// Why [`Session::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The server closed the connection.
    Closed,
    /// The connection failed.
    Errored,
    /// The user asked to leave.
    Quit,
}

impl SessionOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Closed | Self::Quit => 0,
            Self::Errored => 1,
        }
    }
}

/// Parameters for building a new [`Session`].
pub struct SessionConfig<U> {
    pub ui: U,
    pub prefs: Box<dyn PreferenceStore>,
    pub interpreter: Interpreter,
    /// Join automatically with this name once the socket opens.
    pub auto_join: Option<String>,
    /// Overrides the stored timestamp preference when set.
    pub timestamps: Option<bool>,
}

pub struct Session<U> {
    state: ClientState,
    ui: U,
    prefs: Box<dyn PreferenceStore>,
    interpreter: Interpreter,
    suggestions: SuggestionEngine,
    connection: Connection,
    events_rx: mpsc::Receiver<ConnectionEvent>,
    auto_join: Option<String>,
}

impl<U: Ui> Session<U> {
    pub fn new(
        config: SessionConfig<U>,
        connection: Connection,
        events_rx: mpsc::Receiver<ConnectionEvent>,
    ) -> Self {
        let SessionConfig { ui, prefs, interpreter, auto_join, timestamps } = config;

        let mut state = ClientState::new();
        state.timestamps = timestamps
            .unwrap_or_else(|| prefs.get(TIMESTAMP_KEY).is_some_and(|v| v == "true"));

        Self {
            state,
            ui,
            prefs,
            interpreter,
            suggestions: SuggestionEngine::new(),
            connection,
            events_rx,
            auto_join,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    /// Run until the connection ends or the user quits.
    pub async fn run(mut self, mut ui_rx: mpsc::Receiver<UiEvent>) -> SessionOutcome {
        let outcome = loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => {
                            if let Some(outcome) = self.on_connection_event(event) {
                                break outcome;
                            }
                        }
                        None => break SessionOutcome::Closed,
                    }
                }

                event = ui_rx.recv() => {
                    match event {
                        Some(event) => {
                            if let Some(outcome) = self.on_ui_event(event) {
                                break outcome;
                            }
                        }
                        None => {
                            debug!("ui input closed");
                            self.connection.close();
                            break SessionOutcome::Quit;
                        }
                    }
                }
            }
        };

        if outcome == SessionOutcome::Quit {
            self.wait_closed().await;
        }
        outcome
    }

    /// Wait for the driver to flush and report a terminal state after a
    /// user-initiated close. Frames arriving meanwhile are not rendered.
    async fn wait_closed(&mut self) {
        let drain = async {
            while let Some(event) = self.events_rx.recv().await {
                if let ConnectionEvent::State(state) = event {
                    if state.is_terminal() {
                        return state;
                    }
                }
            }
            ConnectionState::Closed
        };
        match tokio::time::timeout(CLOSE_GRACE, drain).await {
            Ok(state) => debug!(%state, "connection closed after quit"),
            Err(_) => warn!(grace = ?CLOSE_GRACE, "connection did not close in time"),
        }
    }

    /// Apply one connection event. Returns an outcome once the connection is
    /// terminal.
    pub fn on_connection_event(&mut self, event: ConnectionEvent) -> Option<SessionOutcome> {
        match event {
            ConnectionEvent::State(next) => self.on_state(next),
            ConnectionEvent::Frame(envelope) => {
                let follow_ups = {
                    let mut ctx = Context {
                        state: &mut self.state,
                        ui: &mut self.ui,
                        prefs: self.prefs.as_mut(),
                    };
                    self.interpreter.handle(envelope, &mut ctx)
                };
                for envelope in follow_ups {
                    if let Err(e) = self.connection.send(&envelope) {
                        debug!(err = %e, "follow-up request dropped");
                    }
                }
                None
            }
            // Logged by the driver; the frame is simply dropped.
            ConnectionEvent::Malformed(_) => None,
        }
    }

    /// Apply one UI event. Returns an outcome when the user quits.
    pub fn on_ui_event(&mut self, event: UiEvent) -> Option<SessionOutcome> {
        match event {
            UiEvent::Join { name } => {
                let _ = self.join(&name);
            }
            UiEvent::Send(text) => self.send_chat(&text),
            UiEvent::ContentChanged { text, caret } => self.content_changed(&text, caret),
            UiEvent::KeyDown { key, ctrl } => {
                self.key_down(key, ctrl);
            }
            UiEvent::SetColor(token) => {
                let _ = self.set_color(&token);
            }
            UiEvent::SetTimestamps(on) => self.set_timestamps(on),
            UiEvent::RequestUsers => self.send_or_report(&OutgoingEnvelope::users()),
            UiEvent::Quit => {
                info!("quit requested");
                self.connection.close();
                return Some(SessionOutcome::Quit);
            }
        }
        None
    }

    fn on_state(&mut self, next: ConnectionState) -> Option<SessionOutcome> {
        self.state.connection = next;
        self.ui.connection_changed(next);
        match next {
            ConnectionState::Connecting => None,
            ConnectionState::Open => {
                if let Some(name) = self.auto_join.take() {
                    let _ = self.join(&name);
                }
                None
            }
            ConnectionState::Closed | ConnectionState::Errored => {
                self.state.in_chat = false;
                self.ui.show_notice(DISCONNECTED_NOTICE);
                Some(if next == ConnectionState::Errored {
                    SessionOutcome::Errored
                } else {
                    SessionOutcome::Closed
                })
            }
        }
    }

    /// Ask to join as `name`, picking a color from preferences.
    pub fn join(&mut self, name: &str) -> Result<(), ClientError> {
        let name = name.trim();
        if !is_valid_name(name) {
            let err = ClientError::Validation(format!(
                "Invalid name. Names are {NAME_MIN_LEN}-{NAME_MAX_LEN} letters, digits, '_' or '-'."
            ));
            self.ui.show_notice(&err.to_string());
            return Err(err);
        }

        let color = self.join_color();
        let envelope = OutgoingEnvelope::join(name, &color)?;
        info!(name, color = %color, "joining");
        self.send_or_report(&envelope);
        Ok(())
    }

    fn join_color(&mut self) -> String {
        match self.prefs.get(COLOR_KEY) {
            Some(color) if is_valid_color(&color) => color,
            Some(color) if !color.is_empty() => {
                info!(color = %color, "stored color is not valid, clearing it");
                if let Err(e) = self.prefs.delete(COLOR_KEY) {
                    warn!(err = %e, "failed to clear stored color");
                }
                random_color()
            }
            _ => random_color(),
        }
    }

    /// Send a chat line. Whitespace-only text is dropped.
    pub fn send_chat(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.send_or_report(&OutgoingEnvelope::chat(text));
    }

    /// Change our color via the `/color` command after checking it locally.
    pub fn set_color(&mut self, token: &str) -> Result<(), ClientError> {
        let token = token.trim();
        if !is_valid_color(token) {
            let err = ClientError::Validation(format!("Invalid color: {token}"));
            self.ui.show_notice(&err.to_string());
            return Err(err);
        }
        self.send_or_report(&OutgoingEnvelope::chat(format!("/color {token}")));
        Ok(())
    }

    pub fn set_timestamps(&mut self, on: bool) {
        self.state.timestamps = on;
        if let Err(e) = self.prefs.set(TIMESTAMP_KEY, if on { "true" } else { "false" }) {
            warn!(err = %e, "failed to persist timestamp preference");
        }
    }

    pub fn content_changed(&mut self, text: &str, caret: usize) {
        self.suggestions.on_content_changed(&self.state, text, caret);
        self.ui.show_suggestions(&self.suggestions.view(&self.state));
    }

    /// Feed a keydown to the suggestion engine and apply any rewrite.
    pub fn key_down(&mut self, key: Key, ctrl: bool) -> KeyOutcome {
        let outcome = self.suggestions.on_key_down(&self.state, key, ctrl);
        if let KeyOutcome::Committed(edit) = &outcome {
            self.ui.set_compose(&edit.text, edit.caret);
        }
        if outcome.is_handled() {
            self.ui.show_suggestions(&self.suggestions.view(&self.state));
        }
        outcome
    }

    fn send_or_report(&mut self, envelope: &OutgoingEnvelope) {
        if let Err(e) = self.connection.send(envelope) {
            warn!(err = %e, kind = ?envelope.kind, "could not send");
            self.interpreter.append(render::SEND_FAILED.to_owned(), &mut self.ui);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
