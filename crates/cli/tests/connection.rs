// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection manager against a real in-process WebSocket server.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use reelchat::connection::{Connection, ConnectionEvent, DEFAULT_KEEPALIVE};
use reelchat::protocol::{ClientKind, Envelope, Hidden, OutgoingEnvelope};
use reelchat::state::ConnectionState;
use reelchat::test_support::{hidden_frame, spawn_chat_server, Received};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_event(rx: &mut mpsc::Receiver<ConnectionEvent>) -> anyhow::Result<ConnectionEvent> {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .map_err(|_| anyhow::anyhow!("event timeout"))?
        .ok_or_else(|| anyhow::anyhow!("event stream closed"))
}

async fn expect_state(
    rx: &mut mpsc::Receiver<ConnectionEvent>,
    expected: ConnectionState,
) -> anyhow::Result<()> {
    match next_event(rx).await? {
        ConnectionEvent::State(state) if state == expected => Ok(()),
        other => anyhow::bail!("expected {expected}, got {other:?}"),
    }
}

#[tokio::test]
async fn opens_and_sends_json() -> anyhow::Result<()> {
    let mut server = spawn_chat_server().await?;
    let (conn, mut events) = Connection::open(&server.ws_url(), DEFAULT_KEEPALIVE);

    expect_state(&mut events, ConnectionState::Open).await?;
    assert_eq!(conn.state(), ConnectionState::Open);

    conn.send(&OutgoingEnvelope::chat("hello"))?;
    let frame = server.recv_json(RECV_TIMEOUT).await?;
    assert_eq!(frame, json!({"Type": 0, "Message": "hello"}));

    conn.send(&OutgoingEnvelope::join("alice", "#ff0000")?)?;
    let frame = server.recv_json(RECV_TIMEOUT).await?;
    assert_eq!(frame["Type"], json!(6));
    let body: serde_json::Value =
        serde_json::from_str(frame["Message"].as_str().unwrap_or_default())?;
    assert_eq!(body, json!({"Name": "alice", "Color": "#ff0000"}));
    Ok(())
}

#[tokio::test]
async fn inbound_frames_arrive_in_order_and_survive_garbage() -> anyhow::Result<()> {
    let server = spawn_chat_server().await?;
    let (_conn, mut events) = Connection::open(&server.ws_url(), DEFAULT_KEEPALIVE);
    expect_state(&mut events, ConnectionState::Open).await?;

    server.push(hidden_frame(ClientKind::Users, json!(["ann"])))?;
    server.push("{not json")?;
    server.push(r#"{"Type":4,"Data":null}"#)?;
    server.push(hidden_frame(ClientKind::Users, json!(["bob"])))?;

    match next_event(&mut events).await? {
        ConnectionEvent::Frame(Envelope::Hidden(Hidden::Users(users))) => {
            assert_eq!(users, vec!["ann"])
        }
        other => anyhow::bail!("unexpected {other:?}"),
    }
    assert!(matches!(next_event(&mut events).await?, ConnectionEvent::Malformed(_)));
    assert!(matches!(next_event(&mut events).await?, ConnectionEvent::Malformed(_)));
    match next_event(&mut events).await? {
        ConnectionEvent::Frame(Envelope::Hidden(Hidden::Users(users))) => {
            assert_eq!(users, vec!["bob"])
        }
        other => anyhow::bail!("unexpected {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn keepalive_pings_while_open() -> anyhow::Result<()> {
    let mut server = spawn_chat_server().await?;
    let (_conn, mut events) = Connection::open(&server.ws_url(), Duration::from_millis(50));
    expect_state(&mut events, ConnectionState::Open).await?;

    for _ in 0..3 {
        let frame = server.recv_json(RECV_TIMEOUT).await?;
        assert_eq!(frame, json!({"Type": 2, "Message": ""}));
    }
    Ok(())
}

#[tokio::test]
async fn user_close_sends_close_frame() -> anyhow::Result<()> {
    let mut server = spawn_chat_server().await?;
    let (conn, mut events) = Connection::open(&server.ws_url(), DEFAULT_KEEPALIVE);
    expect_state(&mut events, ConnectionState::Open).await?;

    conn.close();
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(server.recv(RECV_TIMEOUT).await?, Received::Closed);
    expect_state(&mut events, ConnectionState::Closed).await?;

    let err = conn.send(&OutgoingEnvelope::chat("late"));
    assert!(err.is_err());
    Ok(())
}

#[tokio::test]
async fn close_flushes_accepted_sends_first() -> anyhow::Result<()> {
    for round in 0..20 {
        let mut server = spawn_chat_server().await?;
        let (conn, mut events) = Connection::open(&server.ws_url(), DEFAULT_KEEPALIVE);
        expect_state(&mut events, ConnectionState::Open).await?;

        conn.send(&OutgoingEnvelope::chat(format!("bye {round}")))?;
        conn.close();

        let frame = server.recv_json(RECV_TIMEOUT).await?;
        assert_eq!(frame["Message"], json!(format!("bye {round}")));
        assert_eq!(server.recv(RECV_TIMEOUT).await?, Received::Closed);
        expect_state(&mut events, ConnectionState::Closed).await?;
    }
    Ok(())
}

#[tokio::test]
async fn server_close_is_terminal() -> anyhow::Result<()> {
    let server = spawn_chat_server().await?;
    let (conn, mut events) = Connection::open(&server.ws_url(), Duration::from_millis(50));
    expect_state(&mut events, ConnectionState::Open).await?;

    server.close()?;
    expect_state(&mut events, ConnectionState::Closed).await?;
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(conn.send(&OutgoingEnvelope::users()).is_err());

    // No reconnect and no further events once terminal.
    let after = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
    assert!(matches!(after, Err(_) | Ok(None)), "{after:?}");
    Ok(())
}
