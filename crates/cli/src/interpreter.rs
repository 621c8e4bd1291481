// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns decoded envelopes into state changes and render calls.

use chrono::Timelike;
use tracing::{debug, warn};

use crate::prefs::{PreferenceStore, COLOR_KEY};
use crate::protocol::{
    ChatPayload, CommandKind, CommandPayload, Envelope, EventKind, EventPayload, Hidden,
    MessageKind, OutgoingEnvelope,
};
use crate::render;
use crate::ring::MessageRing;
use crate::state::ClientState;
use crate::ui::{Ui, VideoPlayer};

/// Page opened by a `Help` command without arguments.
pub const HELP_PATH: &str = "/help";
/// Page opened by an `Emotes` command.
pub const EMOTES_PATH: &str = "/emotes";

/// Wall-clock source for chat timestamps, as `(hour, minute)`.
pub type Clock = Box<dyn Fn() -> (u32, u32) + Send>;

/// Everything a single `handle` call may touch.
pub struct Context<'a> {
    pub state: &'a mut ClientState,
    pub ui: &'a mut dyn Ui,
    pub prefs: &'a mut dyn PreferenceStore,
}

pub struct Interpreter {
    ring: MessageRing,
    player: Option<Box<dyn VideoPlayer>>,
    clock: Clock,
}

impl Interpreter {
    /// `max_messages <= 0` keeps every rendered line.
    pub fn new(max_messages: i64) -> Self {
        Self { ring: MessageRing::new(max_messages), player: None, clock: Box::new(local_clock) }
    }

    pub fn with_player(mut self, player: Box<dyn VideoPlayer>) -> Self {
        self.player = Some(player);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> (u32, u32) + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Rendered lines currently retained.
    pub fn messages(&self) -> &MessageRing {
        &self.ring
    }

    /// Apply one inbound envelope. Returns follow-up requests for the server.
    pub fn handle(&mut self, envelope: Envelope, ctx: &mut Context<'_>) -> Vec<OutgoingEnvelope> {
        match envelope {
            Envelope::Hidden(hidden) => {
                self.hidden(hidden, ctx);
                Vec::new()
            }
            Envelope::Event(event) => self.event(event, ctx),
            Envelope::Chat(msg) => {
                self.chat(msg, ctx);
                Vec::new()
            }
            Envelope::Command(cmd) => {
                self.command(cmd, ctx);
                Vec::new()
            }
        }
    }

    /// Append a rendered line, evicting the oldest one when at capacity.
    pub fn append(&mut self, html: String, ui: &mut dyn Ui) {
        if self.ring.push(html.clone()).is_some() {
            ui.evict_oldest();
        }
        ui.append_message(&html);
    }

    fn hidden(&mut self, hidden: Hidden, ctx: &mut Context<'_>) {
        match hidden {
            Hidden::Users(users) => {
                debug!(count = users.len(), "user list replaced");
                ctx.state.replace_users(users);
            }
            Hidden::Emotes(emotes) => {
                debug!(count = emotes.len(), "emote map replaced");
                ctx.state.replace_emotes(emotes);
            }
            Hidden::Color(color) => {
                if let Err(e) = ctx.prefs.set(COLOR_KEY, &color) {
                    warn!(err = %e, "failed to persist color");
                }
                ctx.state.color = Some(color);
            }
            Hidden::Join => {
                ctx.state.in_chat = true;
                ctx.ui.show_notice("");
                ctx.ui.open_chat();
            }
            Hidden::Notify(text) => ctx.ui.show_notice(&text),
            Hidden::Auth(level) => {
                debug!(?level, "permission level updated");
                ctx.state.level = level;
            }
            Hidden::Other(kind) => warn!(?kind, "unhandled hidden message"),
        }
    }

    fn event(&mut self, event: EventPayload, ctx: &mut Context<'_>) -> Vec<OutgoingEnvelope> {
        let html = render::event(&event, &ctx.state.emotes);
        self.append(html, ctx.ui);

        // Membership may have changed; ask for a fresh list.
        if event.event == EventKind::ServerMessage {
            Vec::new()
        } else {
            vec![OutgoingEnvelope::users()]
        }
    }

    fn chat(&mut self, msg: ChatPayload, ctx: &mut Context<'_>) {
        let mut html = render::chat(&msg);
        if ctx.state.timestamps && matches!(msg.message_type, MessageKind::Chat | MessageKind::Action)
        {
            let (hour, minute) = (self.clock)();
            html = render::timestamped(hour, minute, &html);
        }
        self.append(html, ctx.ui);
    }

    fn command(&mut self, cmd: CommandPayload, ctx: &mut Context<'_>) {
        match cmd.command {
            CommandKind::Playing => match cmd.args() {
                [] => ctx.ui.set_playing(None, None),
                [title] => ctx.ui.set_playing(Some(title.as_str()), None),
                [title, link] => {
                    ctx.ui.set_playing(Some(title.as_str()), Some(link.as_str()))
                }
                args => warn!(count = args.len(), "playing command with too many arguments"),
            },
            CommandKind::RefreshPlayer => match self.player.as_mut() {
                Some(player) => player.reinit(),
                None => debug!("no video player to refresh"),
            },
            CommandKind::PurgeChat => {
                self.ring.clear();
                ctx.ui.clear_messages();
                self.append(render::PURGE_NOTICE.to_owned(), ctx.ui);
            }
            CommandKind::Help => {
                let path = cmd.args().first().map_or(HELP_PATH, String::as_str);
                ctx.ui.open_url(path);
            }
            CommandKind::Emotes => ctx.ui.open_url(EMOTES_PATH),
        }
    }
}

fn local_clock() -> (u32, u32) {
    let now = chrono::Local::now();
    (now.hour(), now.minute())
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
