use crate::common::DecodeError;
use crate::domains::world_sync::{
    ConnectionState, EntityKind, EntityPayload, Position, WorldSyncConsumer,
};
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub kind: EntityKind,
    pub payload: EntityPayload,
    /// World-scaled position.
    pub position: Position,
}

type GridKey = [OrderedFloat<f64>; 3];

fn grid_key(position: Position) -> GridKey {
    [
        OrderedFloat(position.x),
        OrderedFloat(position.y),
        OrderedFloat(position.z),
    ]
}

#[derive(Default)]
struct WorldState {
    blocks: Vec<PlacedBlock>,
    by_position: HashMap<GridKey, usize>,
    decode_errors: usize,
    transitions: Vec<(ConnectionState, ConnectionState)>,
}

/// In-memory reconstruction of the server's block world.
///
/// Server coordinates are multiplied by `scale` before placement. A later
/// update at an occupied position replaces the block there but keeps its
/// original placement order.
pub struct BlockWorld {
    scale: f64,
    state: Mutex<WorldState>,
}

impl BlockWorld {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            state: Mutex::new(WorldState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn blocks(&self) -> Vec<PlacedBlock> {
        self.state().blocks.clone()
    }

    pub fn len(&self) -> usize {
        self.state().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a block by its world-scaled position.
    pub fn block_at(&self, position: Position) -> Option<PlacedBlock> {
        let state = self.state();
        state
            .by_position
            .get(&grid_key(position))
            .map(|&i| state.blocks[i].clone())
    }

    pub fn decode_errors(&self) -> usize {
        self.state().decode_errors
    }

    pub fn transitions(&self) -> Vec<(ConnectionState, ConnectionState)> {
        self.state().transitions.clone()
    }
}

impl WorldSyncConsumer for BlockWorld {
    fn on_entity_update(&self, kind: &EntityKind, payload: &EntityPayload, position: Position) {
        let placed = PlacedBlock {
            kind: kind.clone(),
            payload: payload.clone(),
            position: position.scaled(self.scale),
        };
        let key = grid_key(placed.position);

        let mut state = self.state();
        match state.by_position.get(&key).copied() {
            Some(i) => state.blocks[i] = placed,
            None => {
                let i = state.blocks.len();
                state.blocks.push(placed);
                state.by_position.insert(key, i);
            }
        }
    }

    fn on_decode_error(&self, _raw_message: &[u8], _error: &DecodeError) {
        self.state().decode_errors += 1;
    }

    fn on_connection_state_changed(&self, old: ConnectionState, new: ConnectionState) {
        self.state().transitions.push((old, new));
    }
}
