// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod color;
pub mod config;
pub mod connection;
pub mod error;
pub mod interpreter;
pub mod prefs;
pub mod protocol;
pub mod render;
pub mod ring;
pub mod session;
pub mod state;
pub mod suggest;
pub mod terminal;
pub mod test_support;
pub mod ui;
