//! Connection lifecycle as seen by the display client.
//!
//! The transport owns the actual socket. It reports what happens to it as
//! [`ConnectionEvent`]s, and the session folds them into a
//! [`ConnectionState`]:
//!
//! ```text
//! Disconnected --Dialing--> Connecting --Opened--> Connected --InitAcknowledged--> Active
//!      ^                                                                              |
//!      +------------------------------- Closed / Failed ------------------------------+
//! ```
//!
//! `Opened` is accepted from any state: a transport that reconnects without
//! reporting `Closed` still drops back to `Connected` and repeats the handshake.
//!
//! Only `Active` renders geometry; every other state shows the inactive clear.

use std::fmt;

/// Lifecycle state of the connection to the source application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Socket open, `ImInit` sent, waiting for the server's echo
    Connected,
    /// Handshake complete; frames are rendered and input is forwarded
    Active,
}

impl ConnectionState {
    pub fn is_active(self) -> bool {
        self == ConnectionState::Active
    }

    /// Whether the socket is open.
    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Active)
    }

    /// State after `event`, or `None` if the event makes no sense here.
    pub fn next(self, event: &ConnectionEvent) -> Option<ConnectionState> {
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self, event) {
            (_, E::Closed | E::Failed { .. }) => Some(S::Disconnected),
            (S::Disconnected | S::Connecting, E::Dialing) => Some(S::Connecting),
            (_, E::Opened) => Some(S::Connected),
            (S::Connected | S::Active, E::InitAcknowledged) => Some(S::Active),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Active => "Active",
        };
        f.write_str(name)
    }
}

/// Something that happened to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt started
    Dialing,
    /// The socket opened
    Opened,
    /// The server answered `ImInit`
    InitAcknowledged,
    /// The socket closed
    Closed,
    /// The socket failed
    Failed { reason: String },
}

impl ConnectionEvent {
    /// Status line shown on the control panel.
    pub fn status(&self, server_uri: &str) -> String {
        match self {
            ConnectionEvent::Dialing => format!("Connecting to {server_uri}"),
            ConnectionEvent::Opened => "Connected".to_string(),
            ConnectionEvent::InitAcknowledged => "Active".to_string(),
            ConnectionEvent::Closed => "Disconnected".to_string(),
            ConnectionEvent::Failed { reason } => format!("ERROR: {reason}"),
        }
    }

    /// Whether geometry from the previous connection must be dropped.
    pub fn resets_session(&self) -> bool {
        matches!(
            self,
            ConnectionEvent::Opened | ConnectionEvent::Closed | ConnectionEvent::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests;
