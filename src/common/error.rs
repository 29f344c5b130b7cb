use crate::domains::world_sync::ConnectionState;
use thiserror::Error;

/// Failure to establish the transport connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    #[error("Invalid server address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Connection to {address} timed out after {timeout_ms} ms")]
    Timeout { address: String, timeout_ms: u64 },

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Connection closed before it was opened")]
    Closed,
}

/// Mid-session I/O fault on an established (or expected) connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Transport is not connected")]
    NotConnected,

    #[error("Transport I/O error: {0}")]
    Io(String),

    #[error("Transport peer went away")]
    PeerGone,
}

/// A malformed envelope or entity record. Always scoped to one message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Message is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("Malformed envelope: {0}")]
    Envelope(String),

    #[error("Malformed block at index {index}: {reason}")]
    Block { index: usize, reason: String },

    #[error("Malformed {kind} payload: {reason}")]
    Payload { kind: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type ClientResult<T> = Result<T, ClientError>;
