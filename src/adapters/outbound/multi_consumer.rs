use crate::common::DecodeError;
use crate::domains::world_sync::{
    ConnectionState, DynConsumer, EntityKind, EntityPayload, Position, WorldSyncConsumer,
};

/// Forwards every callback to a primary consumer, then to an optional secondary one.
pub struct MultiConsumer {
    primary: DynConsumer,
    secondary: Option<DynConsumer>,
}

impl MultiConsumer {
    pub fn new(primary: DynConsumer, secondary: Option<DynConsumer>) -> Self {
        Self { primary, secondary }
    }
}

impl WorldSyncConsumer for MultiConsumer {
    fn on_entity_update(&self, kind: &EntityKind, payload: &EntityPayload, position: Position) {
        self.primary.on_entity_update(kind, payload, position);
        if let Some(sec) = &self.secondary {
            sec.on_entity_update(kind, payload, position);
        }
    }

    fn on_decode_error(&self, raw_message: &[u8], error: &DecodeError) {
        self.primary.on_decode_error(raw_message, error);
        if let Some(sec) = &self.secondary {
            sec.on_decode_error(raw_message, error);
        }
    }

    fn on_connection_state_changed(&self, old: ConnectionState, new: ConnectionState) {
        self.primary.on_connection_state_changed(old, new);
        if let Some(sec) = &self.secondary {
            sec.on_connection_state_changed(old, new);
        }
    }
}
