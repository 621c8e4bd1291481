// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caret-aware autocompletion for `@name` mentions and `:emote:` codes.
//!
//! The compose text is split on single spaces. The token whose span contains
//! the caret (end inclusive) is checked for a trigger character; if it has
//! one, every pool entry whose lowercase form starts with the lowercased rest
//! of the token is a candidate. The last candidate is selected by default.
//!
//! Caret positions are byte offsets into the UTF-8 compose text.
//!
//! Candidate pools are read from [`ClientState`] only when filtering runs. A
//! user-list or emote-map update that lands while a suggestion is open does
//! not touch the open candidates; the next content change picks it up.

use crate::render;
use crate::state::ClientState;

pub const NAME_TRIGGER: char = '@';
pub const EMOTE_TRIGGER: char = ':';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuggestionKind {
    #[default]
    None,
    Name,
    Emote,
}

/// Open suggestion. When `candidates` is empty, `kind` is `None` and
/// `selected` is empty; otherwise `selected` is one of `candidates`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    pub kind: SuggestionKind,
    pub candidates: Vec<String>,
    pub selected: String,
}

/// Keys the engine cares about. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    Space,
    Other,
}

/// Compose-box rewrite produced by committing a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub text: String,
    pub caret: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Let the key through to the compose box.
    Unhandled,
    /// The engine consumed the key.
    Handled,
    /// The engine consumed the key and rewrote the compose text.
    Committed(TextEdit),
}

impl KeyOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled)
    }
}

/// One row of the candidate list as the UI should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
    pub name: String,
    pub selected: bool,
    /// Image URL for emote candidates.
    pub image: Option<String>,
}

impl SuggestionItem {
    /// HTML for one candidate row.
    pub fn html(&self) -> String {
        let class = if self.selected { r#" class="selectedName""# } else { "" };
        let image = match &self.image {
            Some(url) => render::emote_image(url, &self.name),
            None => String::new(),
        };
        format!("<div{class}>{image}{}</div>", self.name)
    }
}

#[derive(Debug, Default)]
pub struct SuggestionEngine {
    state: SuggestionState,
    /// Byte span `[start, end)` of the token the candidates were drawn for.
    span: Option<(usize, usize)>,
    text: String,
    caret: usize,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn kind(&self) -> SuggestionKind {
        self.state.kind
    }

    pub fn candidates(&self) -> &[String] {
        &self.state.candidates
    }

    pub fn selected(&self) -> &str {
        &self.state.selected
    }

    /// Span of the trigger token behind the open suggestion.
    pub fn span(&self) -> Option<(usize, usize)> {
        self.span
    }

    /// Recompute candidates for new compose text.
    pub fn on_content_changed(&mut self, pools: &ClientState, text: &str, caret: usize) {
        self.text = text.to_owned();
        self.caret = floor_char_boundary(text, caret);
        self.refilter(pools);
    }

    /// Feed a keydown. Returns whether the key was consumed and any rewrite.
    pub fn on_key_down(&mut self, pools: &ClientState, key: Key, ctrl: bool) -> KeyOutcome {
        if ctrl && key == Key::Space {
            self.refilter(pools);
            return KeyOutcome::Handled;
        }

        if self.state.candidates.is_empty() {
            return KeyOutcome::Unhandled;
        }

        match key {
            Key::Escape => {
                self.clear();
                KeyOutcome::Handled
            }
            Key::ArrowUp | Key::ArrowDown => {
                self.move_selection(key == Key::ArrowDown);
                KeyOutcome::Handled
            }
            Key::Tab | Key::Enter => match self.commit() {
                Some(edit) => KeyOutcome::Committed(edit),
                None => KeyOutcome::Handled,
            },
            Key::Space | Key::Other => KeyOutcome::Unhandled,
        }
    }

    /// Candidate rows with selection and emote images resolved.
    pub fn view(&self, pools: &ClientState) -> Vec<SuggestionItem> {
        self.state
            .candidates
            .iter()
            .map(|name| SuggestionItem {
                name: name.clone(),
                selected: *name == self.state.selected,
                image: match self.state.kind {
                    SuggestionKind::Emote => pools.emotes.get(name).cloned(),
                    _ => None,
                },
            })
            .collect()
    }

    fn clear(&mut self) {
        self.state = SuggestionState::default();
        self.span = None;
    }

    fn refilter(&mut self, pools: &ClientState) {
        self.clear();

        for (start, word) in tokens_at(&self.text, self.caret) {
            let (kind, pool): (SuggestionKind, Box<dyn Iterator<Item = &String>>) =
                match word.chars().next() {
                    Some(NAME_TRIGGER) => (SuggestionKind::Name, Box::new(pools.users.iter())),
                    Some(EMOTE_TRIGGER) => (SuggestionKind::Emote, Box::new(pools.emotes.keys())),
                    _ => continue,
                };

            // Both triggers are one byte wide.
            let needle = word[1..].to_lowercase();
            let candidates: Vec<String> =
                pool.filter(|c| c.to_lowercase().starts_with(&needle)).cloned().collect();

            if !candidates.is_empty() {
                self.state.kind = kind;
                self.state.candidates = candidates;
                self.span = Some((start, start + word.len()));
                break;
            }
        }

        self.default_selection();
    }

    /// Highlight the last candidate when nothing is selected.
    fn default_selection(&mut self) {
        if self.state.selected.is_empty() {
            if let Some(last) = self.state.candidates.last() {
                self.state.selected = last.clone();
            }
        }
    }

    fn move_selection(&mut self, down: bool) {
        let candidates = &self.state.candidates;
        let next = match candidates.iter().position(|c| *c == self.state.selected) {
            Some(i) if down => (i + 1).min(candidates.len() - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        if let Some(name) = candidates.get(next) {
            self.state.selected = name.clone();
        }
    }

    fn commit(&mut self) -> Option<TextEdit> {
        let (start, end) = self.span?;
        let replacement = match self.state.kind {
            SuggestionKind::Name => format!("{NAME_TRIGGER}{}", self.state.selected),
            SuggestionKind::Emote => {
                format!("{EMOTE_TRIGGER}{}{EMOTE_TRIGGER}", self.state.selected)
            }
            SuggestionKind::None => return None,
        };

        let head = self.text.get(..start)?;
        let tail = self.text.get(end..)?;
        let separator = if tail.starts_with(' ') { "" } else { " " };
        let text = format!("{head}{replacement}{separator}{tail}");
        // Caret lands after the space following the replacement.
        let caret = start + replacement.len() + 1;

        self.clear();
        self.text = text.clone();
        self.caret = caret;
        Some(TextEdit { text, caret })
    }
}

/// Non-empty space-separated tokens whose span `[start, start+len]` contains
/// `caret`, as `(start, token)`.
fn tokens_at(text: &str, caret: usize) -> impl Iterator<Item = (usize, &str)> {
    let mut start = 0;
    text.split(' ')
        .enumerate()
        .map(move |(i, word)| {
            if i != 0 {
                start += 1;
            }
            let token = (start, word);
            start += word.len();
            token
        })
        .filter(move |&(start, word)| {
            !word.is_empty() && start <= caret && caret <= start + word.len()
        })
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
#[path = "suggest_tests.rs"]
mod tests;
