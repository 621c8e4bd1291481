// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator seams for presentation.
//!
//! The core never draws anything itself. It hands HTML fragments and view
//! changes to a [`Ui`] and pokes an optional [`VideoPlayer`].

use crate::state::ConnectionState;
use crate::suggest::SuggestionItem;

/// Rendering surface driven by the interpreter and the session.
pub trait Ui {
    /// Append one rendered fragment to the message list.
    fn append_message(&mut self, html: &str);

    /// Drop the oldest fragment from the message list.
    fn evict_oldest(&mut self);

    /// Remove every fragment from the message list.
    fn clear_messages(&mut self);

    /// Update the now-playing line. `None` clears the corresponding field.
    fn set_playing(&mut self, title: Option<&str>, link: Option<&str>);

    /// Show a transient notice. An empty string clears it.
    fn show_notice(&mut self, text: &str);

    /// Swap the join prompt for the chat view.
    fn open_chat(&mut self);

    /// Open a server-relative page such as `/help`.
    fn open_url(&mut self, path: &str);

    /// Redraw the suggestion popup. An empty slice hides it.
    fn show_suggestions(&mut self, items: &[SuggestionItem]);

    /// Replace the compose box text and caret.
    fn set_compose(&mut self, text: &str, caret: usize);

    fn connection_changed(&mut self, state: ConnectionState);
}

/// Embedded video player.
pub trait VideoPlayer: Send {
    /// Reload the current stream.
    fn reinit(&mut self);
}
