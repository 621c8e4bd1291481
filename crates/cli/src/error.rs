// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Errors surfaced by the chat client core.
///
/// None of these are fatal to the process. Transport errors end the
/// connection, protocol errors drop a single frame, validation errors abort a
/// local operation before anything reaches the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Socket error or close.
    Transport(String),
    /// Malformed or unrecognized envelope.
    Protocol(String),
    /// Local cosmetic check rejected user input (bad color, bad name).
    Validation(String),
    /// Send attempted while the connection is not open.
    NotConnected,
    /// Outbound envelope could not be serialized.
    Encode(String),
    /// Preference store read/write failure.
    Prefs(String),
}

impl ClientError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Protocol(_) => "PROTOCOL",
            Self::Validation(_) => "VALIDATION",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Encode(_) => "ENCODE",
            Self::Prefs(_) => "PREFS",
        }
    }

    /// Whether the connection is gone for good after this error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Validation(msg) => f.write_str(msg),
            Self::NotConnected => f.write_str("not connected"),
            Self::Encode(msg) => write!(f, "could not encode message: {msg}"),
            Self::Prefs(msg) => write!(f, "preference store error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
