// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented terminal front-end.
//!
//! Each stdin line is compose-box input. A line ending in TAB asks for
//! completion of its last token, lines starting with `\` are local commands,
//! and everything else is sent as chat. Rendered HTML is printed as text.

use std::io::{BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;
use tokio::sync::mpsc;

use crate::error::ClientError;
use crate::session::UiEvent;
use crate::state::ConnectionState;
use crate::suggest::{Key, SuggestionItem};
use crate::ui::Ui;

/// Prefix for local commands.
pub const COMMAND_PREFIX: char = '\\';

const USAGE: &str =
    "commands: \\join <name>, \\color <color>, \\timestamps on|off, \\users, \\quit";

static EMOTE_IMG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*\btitle="([^"]*)"[^>]*>"#).ok());
static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

/// Render an HTML fragment as plain text. Emote images become `:name:`.
pub fn strip_html(html: &str) -> String {
    let mut text = html.to_owned();
    if let Some(re) = EMOTE_IMG.as_ref() {
        text = re
            .replace_all(&text, |caps: &regex::Captures<'_>| match caps.get(1) {
                Some(name) if !name.as_str().is_empty() => format!(":{}:", name.as_str()),
                _ => String::new(),
            })
            .into_owned();
    }
    if let Some(re) = TAG.as_ref() {
        text = re.replace_all(&text, "").into_owned();
    }
    unescape(&text)
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Translate one input line into UI events.
pub fn parse_line(line: &str) -> Result<Vec<UiEvent>, ClientError> {
    let line = line.trim_end_matches(['\n', '\r']);

    if let Some(text) = line.strip_suffix('\t') {
        return Ok(vec![
            UiEvent::ContentChanged { text: text.to_owned(), caret: text.len() },
            UiEvent::KeyDown { key: Key::Tab, ctrl: false },
        ]);
    }

    let Some(command) = line.strip_prefix(COMMAND_PREFIX) else {
        return Ok(vec![UiEvent::Send(line.to_owned())]);
    };

    let mut words = command.split_whitespace();
    let event = match (words.next(), words.next()) {
        (Some("quit"), None) => UiEvent::Quit,
        (Some("users"), None) => UiEvent::RequestUsers,
        (Some("join"), Some(name)) => UiEvent::Join { name: name.to_owned() },
        (Some("color"), Some(color)) => UiEvent::SetColor(color.to_owned()),
        (Some("timestamps"), Some("on")) => UiEvent::SetTimestamps(true),
        (Some("timestamps"), Some("off")) => UiEvent::SetTimestamps(false),
        _ => return Err(ClientError::Validation(USAGE.to_owned())),
    };
    Ok(vec![event])
}

/// Read stdin on a dedicated thread and forward parsed events.
///
/// When `name_from_first_line` is set the first non-empty line is a join.
pub fn spawn_stdin_reader(tx: mpsc::Sender<UiEvent>, name_from_first_line: bool) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut need_name = name_from_first_line;
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let events = if need_name && !line.trim().is_empty() {
                need_name = false;
                Ok(vec![UiEvent::Join { name: line.trim().to_owned() }])
            } else {
                parse_line(&line)
            };
            match events {
                Ok(events) => {
                    for event in events {
                        if tx.blocking_send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    });
}

/// [`Ui`] that prints to a writer, normally stdout.
pub struct TerminalUi<W> {
    out: W,
    /// HTTP base of the server, for turning page paths into links.
    base_url: String,
}

impl<W: Write> TerminalUi<W> {
    pub fn new(out: W, base_url: impl Into<String>) -> Self {
        Self { out, base_url: base_url.into() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Ui for TerminalUi<W> {
    fn append_message(&mut self, html: &str) {
        self.line(&strip_html(html));
    }

    // Printed lines stay in the scrollback.
    fn evict_oldest(&mut self) {}

    fn clear_messages(&mut self) {}

    fn set_playing(&mut self, title: Option<&str>, link: Option<&str>) {
        let text = match (title, link) {
            (Some(title), Some(link)) => format!("* now playing: {title} ({link})"),
            (Some(title), None) => format!("* now playing: {title}"),
            _ => "* now playing: nothing".to_owned(),
        };
        self.line(&text);
    }

    fn show_notice(&mut self, text: &str) {
        if !text.is_empty() {
            self.line(&format!("! {}", strip_html(text)));
        }
    }

    fn open_chat(&mut self) {
        self.line(&format!("* joined; {USAGE}"));
    }

    fn open_url(&mut self, path: &str) {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.base_url.trim_end_matches('/'))
        } else {
            path.to_owned()
        };
        self.line(&format!("* see {url}"));
    }

    fn show_suggestions(&mut self, items: &[SuggestionItem]) {
        if items.is_empty() {
            return;
        }
        let names: Vec<String> = items
            .iter()
            .map(|i| if i.selected { format!("[{}]", i.name) } else { i.name.clone() })
            .collect();
        self.line(&format!("? {}", names.join(" ")));
    }

    fn set_compose(&mut self, text: &str, _caret: usize) {
        self.line(&format!("> {text}"));
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        self.line(&format!("* connection {state}"));
    }
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
