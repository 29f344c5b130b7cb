use super::connection::ConnectionState;
use super::envelope::Position;
use super::payload::{EntityKind, EntityPayload};
use crate::common::{ConnectionError, DecodeError, TransportError};
use async_trait::async_trait;
use std::sync::Arc;

/// Lifecycle and data notifications raised by a transport, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(Vec<u8>),
    Error(TransportError),
    Closed,
}

/// Port for the raw bidirectional byte stream to the server.
/// Adapters provide websocket or in-memory implementations.
#[async_trait]
pub trait Transport: Send {
    /// Suspends until the stream is open, or fails.
    async fn connect(&mut self, address: &str) -> Result<(), ConnectionError>;
    /// Only valid while open; `TransportError::NotConnected` otherwise.
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
    /// Requests an orderly shutdown and suspends until the stream reports closed.
    async fn close(&mut self) -> Result<(), TransportError>;
    /// Waits for the next event. `None` once the stream is exhausted.
    async fn next_event(&mut self) -> Option<TransportEvent>;
    /// Drains queued events without waiting. Used by tick-driven hosts.
    fn pump(&mut self) -> Vec<TransportEvent>;
}

/// Port implemented by whatever applies decoded updates to local state.
/// Consumers never feed back into protocol decisions.
pub trait WorldSyncConsumer: Send + Sync {
    fn on_entity_update(&self, kind: &EntityKind, payload: &EntityPayload, position: Position);
    fn on_decode_error(&self, raw_message: &[u8], error: &DecodeError);
    fn on_connection_state_changed(&self, old: ConnectionState, new: ConnectionState);
}

pub type DynConsumer = Arc<dyn WorldSyncConsumer>;
