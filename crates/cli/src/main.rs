// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use reelchat::config::Config;
use reelchat::connection::Connection;
use reelchat::interpreter::Interpreter;
use reelchat::prefs::{FilePrefs, MemoryPrefs, PreferenceStore};
use reelchat::session::{Session, SessionConfig, SessionOutcome};
use reelchat::terminal::{spawn_stdin_reader, TerminalUi};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    match run(config).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("fatal: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries the chat itself.
    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(config: Config) -> anyhow::Result<SessionOutcome> {
    let prefs: Box<dyn PreferenceStore> = match config.prefs {
        Some(ref path) => Box::new(FilePrefs::load(path)?),
        None => Box::new(MemoryPrefs::new()),
    };

    let ws_url = config.ws_url();
    info!(url = %ws_url, "connecting");
    let (connection, events_rx) = Connection::open(&ws_url, config.keepalive());

    if config.name.is_none() {
        println!("Enter a name to join:");
    }
    let (ui_tx, ui_rx) = mpsc::channel(64);
    spawn_stdin_reader(ui_tx, config.name.is_none());

    let session = Session::new(
        SessionConfig {
            ui: TerminalUi::new(std::io::stdout(), config.http_url()),
            prefs,
            interpreter: Interpreter::new(config.max_messages),
            auto_join: config.name.clone(),
            timestamps: config.timestamps,
        },
        connection,
        events_rx,
    );

    let outcome = session.run(ui_rx).await;
    info!(?outcome, "session ended");
    Ok(outcome)
}
