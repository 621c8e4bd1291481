// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::session::is_valid_name;

/// Rendered lines kept before the oldest is dropped.
pub const DEFAULT_MAX_MESSAGES: i64 = 300;

/// Seconds between keepalive pings.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 45;

/// Path of the chat socket on the server.
const WS_PATH: &str = "/ws";

/// Terminal client for a watch-party chat server.
#[derive(Debug, Parser)]
#[command(name = "reelchat", version, about)]
pub struct Config {
    /// Server URL (e.g. http://127.0.0.1:8089).
    #[arg(env = "REELCHAT_URL")]
    pub url: String,

    /// Chat name. When omitted, the first input line is used.
    #[arg(long, env = "REELCHAT_NAME")]
    pub name: Option<String>,

    /// Rendered lines to keep (0 or less keeps everything).
    #[arg(
        long,
        env = "REELCHAT_MAX_MESSAGES",
        default_value_t = DEFAULT_MAX_MESSAGES,
        allow_negative_numbers = true
    )]
    pub max_messages: i64,

    /// Seconds between keepalive pings.
    #[arg(long, env = "REELCHAT_KEEPALIVE_SECS", default_value_t = DEFAULT_KEEPALIVE_SECS)]
    pub keepalive_secs: u64,

    /// Prefix chat lines with a local HH:MM. Overrides the stored preference.
    #[arg(
        long,
        env = "REELCHAT_TIMESTAMPS",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub timestamps: Option<bool>,

    /// JSON file for persistent preferences. In-memory when omitted.
    #[arg(long, env = "REELCHAT_PREFS")]
    pub prefs: Option<PathBuf>,

    /// Log format (json or text).
    #[arg(long, env = "REELCHAT_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "REELCHAT_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.url.trim().is_empty() {
            anyhow::bail!("a server URL is required");
        }
        let scheme_ok = ["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|s| self.url.starts_with(s))
            || !self.url.contains("://");
        if !scheme_ok {
            anyhow::bail!("unsupported URL scheme: {}", self.url);
        }

        if self.keepalive_secs == 0 {
            anyhow::bail!("--keepalive-secs must be greater than zero");
        }

        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other} (expected json or text)"),
        }

        if let Some(ref name) = self.name {
            if !is_valid_name(name) {
                anyhow::bail!("invalid --name: {name}");
            }
        }

        Ok(())
    }

    /// WebSocket endpoint derived from `url`.
    ///
    /// HTTP(S) URLs map to WS(S) with the chat path appended. WS(S) URLs are
    /// used as given.
    pub fn ws_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if base.starts_with("ws://") || base.starts_with("wss://") {
            base.to_owned()
        } else if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}{WS_PATH}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}{WS_PATH}")
        } else {
            format!("ws://{base}{WS_PATH}")
        }
    }

    /// HTTP base for server pages such as `/help`.
    pub fn http_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("wss://") {
            format!("https://{}", rest.trim_end_matches(WS_PATH))
        } else if let Some(rest) = base.strip_prefix("ws://") {
            format!("http://{}", rest.trim_end_matches(WS_PATH))
        } else if base.contains("://") {
            base.to_owned()
        } else {
            format!("http://{base}")
        }
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    /// Build a minimal `Config` for tests.
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            url: "http://127.0.0.1:8089".into(),
            name: None,
            max_messages: DEFAULT_MAX_MESSAGES,
            keepalive_secs: DEFAULT_KEEPALIVE_SECS,
            timestamps: None,
            prefs: None,
            log_format: "text".into(),
            log_level: "debug".into(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
