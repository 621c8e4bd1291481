// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[yare::parameterized(
    connect_open = { ConnectionState::Connecting, ConnectionState::Open, true },
    connect_error = { ConnectionState::Connecting, ConnectionState::Errored, true },
    open_closed = { ConnectionState::Open, ConnectionState::Closed, true },
    open_errored = { ConnectionState::Open, ConnectionState::Errored, true },
    closed_reconnect = { ConnectionState::Closed, ConnectionState::Connecting, false },
    errored_reconnect = { ConnectionState::Errored, ConnectionState::Connecting, false },
    closed_open = { ConnectionState::Closed, ConnectionState::Open, false },
    open_connecting = { ConnectionState::Open, ConnectionState::Connecting, false },
)]
fn transitions(from: ConnectionState, to: ConnectionState, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn u8_roundtrip_for_atomics() {
    for state in [
        ConnectionState::Connecting,
        ConnectionState::Open,
        ConnectionState::Closed,
        ConnectionState::Errored,
    ] {
        assert_eq!(ConnectionState::from_u8(state.to_u8()), state);
    }
}

#[test]
fn users_keep_server_order() {
    let mut state = ClientState::new();
    state.replace_users(["zed".to_owned(), "ann".to_owned(), "bob".to_owned()]);
    let order: Vec<&str> = state.users.iter().map(String::as_str).collect();
    assert_eq!(order, vec!["zed", "ann", "bob"]);
}

proptest! {
    #[test]
    fn users_equal_last_update(updates in prop::collection::vec(
        prop::collection::vec("[a-z]{3,8}", 0..6), 1..8)
    ) {
        let mut state = ClientState::new();
        for update in &updates {
            state.replace_users(update.clone());
        }
        let last = updates.last().cloned().unwrap_or_default();
        let mut expected: Vec<String> = Vec::new();
        for name in last {
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        let got: Vec<String> = state.users.iter().cloned().collect();
        prop_assert_eq!(got, expected);
    }
}
