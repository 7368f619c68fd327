//! State machine tests for the connection lifecycle

use super::*;
use proptest::prelude::*;

fn event_strategy() -> impl Strategy<Value = ConnectionEvent> {
    prop_oneof![
        Just(ConnectionEvent::Dialing),
        Just(ConnectionEvent::Opened),
        Just(ConnectionEvent::InitAcknowledged),
        Just(ConnectionEvent::Closed),
        "[a-z ]{0,12}".prop_map(|reason| ConnectionEvent::Failed { reason }),
    ]
}

#[test]
fn handshake_walks_to_active() {
    let mut state = ConnectionState::default();
    for (event, expected) in [
        (ConnectionEvent::Dialing, ConnectionState::Connecting),
        (ConnectionEvent::Opened, ConnectionState::Connected),
        (ConnectionEvent::InitAcknowledged, ConnectionState::Active),
    ] {
        state = state.next(&event).expect("valid transition");
        assert_eq!(state, expected);
    }
    assert!(state.is_active());
    assert!(state.is_open());
}

#[test]
fn init_echo_before_open_is_ignored() {
    assert_eq!(ConnectionState::Connecting.next(&ConnectionEvent::InitAcknowledged), None);
    assert_eq!(ConnectionState::Disconnected.next(&ConnectionEvent::InitAcknowledged), None);
}

#[test]
fn open_without_dialing_is_accepted() {
    assert_eq!(
        ConnectionState::Disconnected.next(&ConnectionEvent::Opened),
        Some(ConnectionState::Connected)
    );
}

#[test]
fn reopening_restarts_the_handshake_from_any_state() {
    for state in [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Active,
    ] {
        assert_eq!(state.next(&ConnectionEvent::Opened), Some(ConnectionState::Connected));
    }
}

#[test]
fn close_and_failure_always_disconnect() {
    let failure = ConnectionEvent::Failed { reason: "reset".to_string() };
    for state in [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Active,
    ] {
        assert_eq!(state.next(&ConnectionEvent::Closed), Some(ConnectionState::Disconnected));
        assert_eq!(state.next(&failure), Some(ConnectionState::Disconnected));
    }
}

#[test]
fn status_lines_match_control_panel_text() {
    let uri = "ws://127.0.0.1:7002";
    assert_eq!(ConnectionEvent::Dialing.status(uri), "Connecting to ws://127.0.0.1:7002");
    assert_eq!(ConnectionEvent::Opened.status(uri), "Connected");
    assert_eq!(ConnectionEvent::Closed.status(uri), "Disconnected");
    assert_eq!(
        ConnectionEvent::Failed { reason: "refused".to_string() }.status(uri),
        "ERROR: refused"
    );
}

proptest! {
    #[test]
    fn only_the_init_echo_activates(
        events in prop::collection::vec(event_strategy(), 0..32),
    ) {
        let mut state = ConnectionState::default();
        for event in &events {
            let before = state;
            if let Some(next) = state.next(event) {
                state = next;
            }
            if state.is_active() && !before.is_active() {
                prop_assert_eq!(event, &ConnectionEvent::InitAcknowledged);
                prop_assert_eq!(before, ConnectionState::Connected);
            }
        }
    }
}
