use crate::common::DecodeError;
use crate::domains::logger::DynLogger;
use crate::domains::world_sync::{
    ConnectionState, EntityKind, EntityPayload, Position, WorldSyncConsumer,
};

/// Writes every consumer callback to the injected logger.
pub struct LoggingConsumer {
    logger: DynLogger,
}

impl LoggingConsumer {
    pub fn new(logger: DynLogger) -> Self {
        Self { logger }
    }
}

impl WorldSyncConsumer for LoggingConsumer {
    fn on_entity_update(&self, kind: &EntityKind, payload: &EntityPayload, position: Position) {
        self.logger.debug(&format!(
            "{} at ({}, {}, {}): {:?}",
            kind, position.x, position.y, position.z, payload
        ));
    }

    fn on_decode_error(&self, raw_message: &[u8], error: &DecodeError) {
        self.logger.warn(&format!(
            "Dropped message of {} bytes: {}",
            raw_message.len(),
            error
        ));
    }

    fn on_connection_state_changed(&self, old: ConnectionState, new: ConnectionState) {
        self.logger.info(&format!("Connection {} -> {}", old, new));
    }
}
