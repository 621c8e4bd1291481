// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `reelchat` binary as a subprocess, feeds it stdin,
//! and collects what it prints.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use tokio::sync::mpsc;

/// Resolve the path to the compiled `reelchat` binary.
pub fn reelchat_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("reelchat")
}

/// A running `reelchat` process that is killed on drop.
pub struct ReelchatProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    lines_rx: mpsc::UnboundedReceiver<String>,
}

impl ReelchatProcess {
    /// Spawn the binary with `args`, piping stdin and stdout.
    pub fn start(args: &[&str]) -> anyhow::Result<Self> {
        let mut child = Command::new(reelchat_binary())
            .args(args)
            .env_remove("REELCHAT_URL")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout =
            child.stdout.take().ok_or_else(|| anyhow::anyhow!("stdout not captured"))?;
        let (lines_tx, lines_rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(Self { child, stdin, lines_rx })
    }

    /// Write one line to the process's stdin.
    pub fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| anyhow::anyhow!("stdin closed"))?;
        writeln!(stdin, "{line}")?;
        stdin.flush()?;
        Ok(())
    }

    /// Close stdin, as a user hitting EOF would.
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Wait for a printed line containing `needle`, returning it.
    pub async fn wait_for_line(&mut self, needle: &str, timeout: Duration) -> anyhow::Result<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let line = tokio::time::timeout_at(deadline, self.lines_rx.recv())
                .await
                .map_err(|_| anyhow::anyhow!("no line containing {needle:?} within {timeout:?}"))?
                .ok_or_else(|| anyhow::anyhow!("stdout closed before {needle:?}"))?;
            if line.contains(needle) {
                return Ok(line);
            }
        }
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("reelchat did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for ReelchatProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
