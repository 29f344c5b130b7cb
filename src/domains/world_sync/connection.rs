use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Disconnected, Closed)
                | (Connecting, Open)
                | (Connecting, Errored)
                | (Connecting, Closing)
                | (Open, Closing)
                | (Open, Closed)
                | (Open, Errored)
                | (Closing, Closed)
        )
    }

    /// `Closed` and `Errored` absorb every further request.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Open",
            ConnectionState::Closing => "Closing",
            ConnectionState::Closed => "Closed",
            ConnectionState::Errored => "Errored",
        };
        f.write_str(name)
    }
}

/// One logical session to the server, owned by the connection controller.
#[derive(Debug, Clone)]
pub struct Connection {
    pub session_id: Uuid,
    pub address: String,
    pub state: ConnectionState,
    pub last_error: Option<String>,
    pub opened_at: Option<DateTime<Utc>>,
}

impl Connection {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            address: address.into(),
            state: ConnectionState::Disconnected,
            last_error: None,
            opened_at: None,
        }
    }
}
