// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTML fragment templates for every renderable subtype.
//!
//! Message text arrives already escaped (and with emotes expanded) from the
//! server, so fields are interpolated verbatim.

use std::collections::BTreeMap;

use crate::protocol::{ChatPayload, EventKind, EventPayload, MessageKind, PermissionLevel};

pub const MOD_BADGE: &str = "/static/img/mod.png";
pub const ADMIN_BADGE: &str = "/static/img/admin.png";

/// Emote shown in the "unknown rename" fallback lines.
const FALLBACK_EMOTE: &str = "Jebaited";

/// Appended after a purge wipes the list.
pub const PURGE_NOTICE: &str =
    r#"<span class="notice">Chat has been purged by a moderator.</span>"#;

/// Shown locally when an outbound message could not be sent.
pub const SEND_FAILED: &str = r#"<span style="color: red;">Could not send message</span>"#;

/// Render a chat payload. `Chat` kind lines carry a role badge.
pub fn chat(msg: &ChatPayload) -> String {
    let ChatPayload { from, color, message, .. } = msg;
    match msg.message_type {
        MessageKind::Action => format!(
            r#"<span style="color:{color}"><span class="name">{from}</span> <span class="cmdme">{message}</span></span>"#
        ),
        MessageKind::Server => format!(r#"<span class="announcement">{message}</span>"#),
        MessageKind::Error => format!(r#"<span class="error">{message}</span>"#),
        MessageKind::Notice => format!(r#"<span class="notice">{message}</span>"#),
        MessageKind::CommandResponse => format!(r#"<span class="command">{message}</span>"#),
        MessageKind::CommandError => format!(r#"<span class="commanderror">{message}</span>"#),
        MessageKind::Chat => {
            let badge = match msg.level {
                PermissionLevel::Mod => badge(MOD_BADGE),
                PermissionLevel::Admin => badge(ADMIN_BADGE),
                PermissionLevel::Normal => String::new(),
            };
            format!(
                r#"<span>{badge}<span class="name" style="color:{color}">{from}</span><b>:</b> <span class="msg">{message}</span></span>"#
            )
        }
    }
}

fn badge(src: &str) -> String {
    format!(r#"<img src="{src}" class="badge" />"#)
}

/// Render a membership or rename event.
///
/// `emotes` is consulted only for the fallback line shown when a rename
/// event does not carry both names.
pub fn event(ev: &EventPayload, emotes: &BTreeMap<String, String>) -> String {
    let EventPayload { user, color, .. } = ev;
    let name = |n: &str| format!(r#"<span class="name" style="color:{color}">{n}</span>"#);
    match ev.event {
        EventKind::Kick => format!(r#"<span class="event">{} has been kicked.</span>"#, name(user)),
        EventKind::Leave => {
            format!(r#"<span class="event">{} has left the chat.</span>"#, name(user))
        }
        EventKind::Ban => format!(r#"<span class="event">{} has been banned.</span>"#, name(user)),
        EventKind::Join => {
            format!(r#"<span class="event">{} has joined the chat.</span>"#, name(user))
        }
        EventKind::ServerMessage => format!(r#"<span class="announcement">{user}</span>"#),
        EventKind::NameChange => match ev.renamed() {
            Some((old, new)) => format!(
                r#"<span class="event">{} has changed their name to {}.</span>"#,
                name(old),
                name(new)
            ),
            None => format!(
                r#"<span class="event">Somebody changed their name, but IDK who {}.</span>"#,
                emote_or_text(FALLBACK_EMOTE, emotes)
            ),
        },
        EventKind::NameChangeForced => match ev.renamed() {
            Some((old, new)) => format!(
                r#"<span class="event">{} has had their name changed to {} by an admin.</span>"#,
                name(old),
                name(new)
            ),
            None => format!(
                r#"<span class="event">An admin changed somebody's name, but IDK who {}.</span>"#,
                emote_or_text(FALLBACK_EMOTE, emotes)
            ),
        },
    }
}

/// Inline image for an emote.
pub fn emote_image(url: &str, name: &str) -> String {
    format!(r#"<img src="{url}" height="28px" title="{name}" />"#)
}

fn emote_or_text(name: &str, emotes: &BTreeMap<String, String>) -> String {
    match emotes.get(name) {
        Some(url) => emote_image(url, name),
        None => name.to_owned(),
    }
}

/// Prefix a client-local `HH:MM` stamp.
pub fn timestamped(hour: u32, minute: u32, html: &str) -> String {
    format!(r#"<span class="time">{hour:02}:{minute:02}</span> {html}"#)
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
