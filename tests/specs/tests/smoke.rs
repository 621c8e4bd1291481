// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `reelchat` binary against an
//! in-process chat server.

use std::time::Duration;

use serde_json::json;

use reelchat::protocol::{ClientKind, MessageKind, PermissionLevel};
use reelchat::test_support::{chat_frame, hidden_frame, spawn_chat_server, Received};
use reelchat_specs::ReelchatProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn joins_prints_chat_and_quits() -> anyhow::Result<()> {
    let mut server = spawn_chat_server().await?;
    let url = server.http_url();
    let mut proc = ReelchatProcess::start(&[&url, "--name", "alice"])?;

    let join = server.recv_non_ping(TIMEOUT).await?;
    assert_eq!(join["Type"], json!(i64::from(ClientKind::Join)));
    let body: serde_json::Value =
        serde_json::from_str(join["Message"].as_str().unwrap_or_default())?;
    assert_eq!(body["Name"], json!("alice"));

    server.push(hidden_frame(ClientKind::Join, json!(null)))?;
    proc.wait_for_line("* joined", TIMEOUT).await?;

    server.push(chat_frame("bob", "hi &amp; bye", MessageKind::Chat, PermissionLevel::Normal))?;
    let line = proc.wait_for_line("bob", TIMEOUT).await?;
    assert!(line.ends_with("bob: hi & bye"), "{line}");

    proc.send_line("hello from alice")?;
    let chat = server.recv_non_ping(TIMEOUT).await?;
    assert_eq!(chat, json!({"Type": 0, "Message": "hello from alice"}));

    proc.send_line("see you")?;
    proc.send_line("\\quit")?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(0));

    // Lines typed right before quitting still reach the server.
    let chat = server.recv_non_ping(TIMEOUT).await?;
    assert_eq!(chat, json!({"Type": 0, "Message": "see you"}));
    assert_eq!(server.recv(TIMEOUT).await?, Received::Closed);
    Ok(())
}

#[tokio::test]
async fn server_close_prints_notice_and_exits() -> anyhow::Result<()> {
    let mut server = spawn_chat_server().await?;
    let url = server.ws_url();
    let mut proc = ReelchatProcess::start(&[&url, "--name", "alice"])?;
    let _join = server.recv_non_ping(TIMEOUT).await?;

    server.close()?;
    proc.wait_for_line("* connection closed", TIMEOUT).await?;
    proc.wait_for_line("! ", TIMEOUT).await?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(0));

    // Nothing reconnects.
    assert!(matches!(server.recv(Duration::from_millis(200)).await, Err(_) | Ok(Received::Closed)));
    Ok(())
}

#[tokio::test]
async fn unreachable_server_exits_nonzero() -> anyhow::Result<()> {
    let mut proc = ReelchatProcess::start(&["ws://127.0.0.1:1/ws", "--name", "alice"])?;
    proc.wait_for_line("* connection errored", TIMEOUT).await?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(1));
    Ok(())
}

#[tokio::test]
async fn invalid_name_is_rejected_at_startup() -> anyhow::Result<()> {
    let mut proc = ReelchatProcess::start(&["ws://127.0.0.1:1/ws", "--name", "a b"])?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}
