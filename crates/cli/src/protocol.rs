// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the chat protocol.
//!
//! Server → client frames are `{"Type": <DataKind>, "Data": {...}}` where the
//! family integer selects the payload shape. Client → server frames are
//! `{"Type": <ClientKind>, "Message": "..."}`. Field names are PascalCase on
//! the wire and every enum travels as a bare integer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Separator between the old and new name in a rename event's `User` field.
pub const NAME_SEPARATOR: char = ':';

/// Integer-tagged enum with serde going through `i64`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $($variant),+
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(value: i64) -> Result<Self, String> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} {other}", stringify!($name))),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                match value {
                    $($name::$variant => $value),+
                }
            }
        }
    };
}

wire_enum! {
    /// Top-level family of a server envelope.
    DataKind {
        Invalid = 0,
        Chat = 1,
        Command = 2,
        Event = 3,
        Client = 4,
        Hidden = 5,
    }
}

wire_enum! {
    /// Client request kinds. `Users`, `Color`, `Emotes`, `Join`, `Notify` and
    /// `Auth` double as hidden-payload tags from the server.
    ClientKind {
        Message = 0,
        Users = 1,
        Ping = 2,
        Auth = 3,
        Color = 4,
        Emotes = 5,
        Join = 6,
        Notify = 7,
    }
}

wire_enum! {
    MessageKind {
        Chat = 0,
        Action = 1,
        Server = 2,
        Error = 3,
        Notice = 4,
        CommandResponse = 5,
        CommandError = 6,
    }
}

wire_enum! {
    PermissionLevel {
        Normal = 0,
        Mod = 1,
        Admin = 2,
    }
}

wire_enum! {
    EventKind {
        Join = 0,
        Leave = 1,
        Kick = 2,
        Ban = 3,
        ServerMessage = 4,
        NameChange = 5,
        NameChangeForced = 6,
    }
}

wire_enum! {
    CommandKind {
        Playing = 0,
        RefreshPlayer = 1,
        PurgeChat = 2,
        Help = 3,
        Emotes = 4,
    }
}

impl Default for PermissionLevel {
    fn default() -> Self {
        Self::Normal
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// A decoded server envelope. Exactly one family per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Hidden(Hidden),
    Event(EventPayload),
    Chat(ChatPayload),
    Command(CommandPayload),
}

impl Envelope {
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Hidden(_) => DataKind::Hidden,
            Self::Event(_) => DataKind::Event,
            Self::Chat(_) => DataKind::Chat,
            Self::Command(_) => DataKind::Command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChatPayload {
    pub from: String,
    pub color: String,
    pub message: String,
    #[serde(default)]
    pub level: PermissionLevel,
    #[serde(rename = "Type")]
    pub message_type: MessageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventPayload {
    pub event: EventKind,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub color: String,
}

impl EventPayload {
    /// Split a rename event's `User` into `(old, new)`.
    ///
    /// Returns `None` when the separator is missing. Extra separators are
    /// ignored past the second part.
    pub fn renamed(&self) -> Option<(&str, &str)> {
        let mut parts = self.user.split(NAME_SEPARATOR);
        let old = parts.next()?;
        let new = parts.next()?;
        Some((old, new))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandPayload {
    pub command: CommandKind,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CommandPayload {
    pub fn args(&self) -> &[String] {
        self.arguments.as_deref().unwrap_or_default()
    }
}

/// Control-plane update that is not rendered as a chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hidden {
    /// Full user list snapshot, in server order.
    Users(Vec<String>),
    /// The color the server assigned to us.
    Color(String),
    /// Full emote name → image URL snapshot.
    Emotes(BTreeMap<String, String>),
    /// Our join was accepted.
    Join,
    /// Transient notice for the notify box.
    Notify(String),
    /// Our permission level.
    Auth(PermissionLevel),
    /// A client kind that has no hidden meaning (`Message`, `Ping`).
    Other(ClientKind),
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "Type")]
    kind: i64,
    #[serde(rename = "Data", default)]
    data: Value,
}

#[derive(Deserialize)]
struct RawHidden {
    #[serde(rename = "Type")]
    kind: ClientKind,
    #[serde(rename = "Data", default)]
    data: Value,
}

impl Hidden {
    fn from_raw(raw: RawHidden) -> Result<Self, ClientError> {
        let data = raw.data;
        let hidden = match raw.kind {
            ClientKind::Users => Self::Users(or_default(data)?),
            ClientKind::Color => Self::Color(or_default(data)?),
            ClientKind::Emotes => Self::Emotes(or_default(data)?),
            ClientKind::Join => Self::Join,
            ClientKind::Notify => Self::Notify(or_default(data)?),
            ClientKind::Auth => Self::Auth(serde_json::from_value(data)?),
            other @ (ClientKind::Message | ClientKind::Ping) => Self::Other(other),
        };
        Ok(hidden)
    }
}

/// `null` (or absent) decodes to the type's default.
fn or_default<T>(value: Value) -> Result<T, ClientError>
where
    T: Default + serde::de::DeserializeOwned,
{
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse one inbound text frame.
pub fn decode(text: &str) -> Result<Envelope, ClientError> {
    let raw: RawEnvelope = serde_json::from_str(text)?;
    let kind = DataKind::try_from(raw.kind).map_err(ClientError::Protocol)?;
    let envelope = match kind {
        DataKind::Chat => Envelope::Chat(serde_json::from_value(raw.data)?),
        DataKind::Command => Envelope::Command(serde_json::from_value(raw.data)?),
        DataKind::Event => Envelope::Event(serde_json::from_value(raw.data)?),
        DataKind::Hidden => Envelope::Hidden(Hidden::from_raw(serde_json::from_value(raw.data)?)?),
        DataKind::Invalid | DataKind::Client => {
            return Err(ClientError::Protocol(format!("unexpected inbound family {kind:?}")));
        }
    };
    Ok(envelope)
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEnvelope {
    #[serde(rename = "Type")]
    pub kind: ClientKind,
    #[serde(rename = "Message")]
    pub message: String,
}

/// Body of a `Join` request, carried JSON-encoded inside `Message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinData {
    pub name: String,
    pub color: String,
}

impl OutgoingEnvelope {
    pub fn new(kind: ClientKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// A chat line (or `/command`) typed by the user.
    pub fn chat(text: impl Into<String>) -> Self {
        Self::new(ClientKind::Message, text)
    }

    pub fn ping() -> Self {
        Self::new(ClientKind::Ping, "")
    }

    /// Ask the server for a fresh user list.
    pub fn users() -> Self {
        Self::new(ClientKind::Users, "")
    }

    pub fn join(name: &str, color: &str) -> Result<Self, ClientError> {
        let data = JoinData { name: name.to_owned(), color: color.to_owned() };
        let body = serde_json::to_string(&data).map_err(|e| ClientError::Encode(e.to_string()))?;
        Ok(Self::new(ClientKind::Join, body))
    }

    pub fn is_keepalive(&self) -> bool {
        self.kind == ClientKind::Ping
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|e| ClientError::Encode(e.to_string()))
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
