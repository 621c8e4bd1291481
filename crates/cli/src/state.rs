// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexSet;

use crate::protocol::PermissionLevel;

/// Socket lifecycle. `Closed` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Open) | (Connecting, Errored) | (Connecting, Closed) | (Open, Closed)
                | (Open, Errored)
        )
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closed => 2,
            Self::Errored => 3,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closed,
            _ => Self::Errored,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the server has told us about the room, for one session.
///
/// `users` and `emotes` are replaced wholesale on every update; nothing is
/// merged.
#[derive(Debug, Clone)]
pub struct ClientState {
    /// Known users, in the order the server sent them.
    pub users: IndexSet<String>,
    /// Emote name → image URL.
    pub emotes: BTreeMap<String, String>,
    pub in_chat: bool,
    pub connection: ConnectionState,
    pub level: PermissionLevel,
    /// Color the server last confirmed for us.
    pub color: Option<String>,
    /// Prefix chat lines with a local `HH:MM`.
    pub timestamps: bool,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            users: IndexSet::new(),
            emotes: BTreeMap::new(),
            in_chat: false,
            connection: ConnectionState::Connecting,
            level: PermissionLevel::Normal,
            color: None,
            timestamps: false,
        }
    }
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_users(&mut self, users: impl IntoIterator<Item = String>) {
        self.users = users.into_iter().collect();
    }

    pub fn replace_emotes(&mut self, emotes: BTreeMap<String, String>) {
        self.emotes = emotes;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
