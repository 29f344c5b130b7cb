#![allow(dead_code)]

use spacebuild_client::domains::world_sync::{
    ConnectionState, EntityKind, EntityPayload, Position, WorldSyncConsumer,
};
use spacebuild_client::DecodeError;
use std::sync::Mutex;

/// Consumer that records every callback for later assertions.
#[derive(Default)]
pub struct Recorder {
    pub updates: Mutex<Vec<(EntityKind, EntityPayload, Position)>>,
    pub errors: Mutex<Vec<(Vec<u8>, DecodeError)>>,
    pub transitions: Mutex<Vec<(ConnectionState, ConnectionState)>>,
}

impl Recorder {
    pub fn updates(&self) -> Vec<(EntityKind, EntityPayload, Position)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<(Vec<u8>, DecodeError)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<(ConnectionState, ConnectionState)> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn visited(&self, state: ConnectionState) -> bool {
        self.transitions()
            .iter()
            .any(|(from, to)| *from == state || *to == state)
    }
}

impl WorldSyncConsumer for Recorder {
    fn on_entity_update(&self, kind: &EntityKind, payload: &EntityPayload, position: Position) {
        self.updates
            .lock()
            .unwrap()
            .push((kind.clone(), payload.clone(), position));
    }

    fn on_decode_error(&self, raw_message: &[u8], error: &DecodeError) {
        self.errors
            .lock()
            .unwrap()
            .push((raw_message.to_vec(), error.clone()));
    }

    fn on_connection_state_changed(&self, old: ConnectionState, new: ConnectionState) {
        self.transitions.lock().unwrap().push((old, new));
    }
}

pub const TILE_MESSAGE: &str = r#"{"blocks":[{"block_type":"tile","block_json":"{\"color\":3}","block_coords":[1,0,2]}]}"#;
pub const UNKNOWN_MESSAGE: &str = r#"{"blocks":[{"block_type":"unknown_future_kind","block_json":"{}","block_coords":[0,0,0]}]}"#;
pub const MISSING_COORDS_MESSAGE: &str = r#"{"blocks":[{"block_type":"tile"}]}"#;

pub fn tile_block(color: i64, x: f64, y: f64, z: f64) -> String {
    format!(
        r#"{{"block_type":"tile","block_json":"{{\"color\":{}}}","block_coords":[{},{},{}]}}"#,
        color, x, y, z
    )
}

pub fn envelope(blocks: &[String]) -> String {
    format!(r#"{{"blocks":[{}]}}"#, blocks.join(","))
}
