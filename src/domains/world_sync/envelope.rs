use super::payload::{EntityKind, EntityPayload, RawPayload};
use crate::common::DecodeResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityUpdate {
    pub kind: EntityKind,
    pub payload: RawPayload,
    pub position: Position,
}

impl EntityUpdate {
    pub fn decode_payload(&self) -> DecodeResult<Option<EntityPayload>> {
        EntityPayload::decode(&self.kind, &self.payload)
    }
}

/// An entity update whose kind is known and whose payload has been decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedUpdate<'a> {
    pub kind: &'a EntityKind,
    pub payload: EntityPayload,
    pub position: Position,
}

/// All entity updates carried by one received message, in arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateEnvelope {
    pub updates: Vec<EntityUpdate>,
}

impl UpdateEnvelope {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Decodes the payload of every recognized update, keeping order.
    /// Fails as a whole if any recognized payload is malformed.
    pub fn recognized(&self) -> DecodeResult<Vec<RecognizedUpdate<'_>>> {
        let mut resolved = Vec::with_capacity(self.updates.len());
        for update in &self.updates {
            if let Some(payload) = update.decode_payload()? {
                resolved.push(RecognizedUpdate {
                    kind: &update.kind,
                    payload,
                    position: update.position,
                });
            }
        }
        Ok(resolved)
    }
}

// Wire representation: `{ "blocks": [ { block_type, block_json, block_coords } ] }`

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub blocks: Vec<WireBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBlock {
    pub block_type: String,
    pub block_json: String,
    pub block_coords: WireCoords,
}

/// Coordinates as a 3-element array, or as the `{x, y, z}` object the server emits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(
    untagged,
    expecting = "block_coords must be [x, y, z] or {\"x\", \"y\", \"z\"} with numeric components"
)]
pub enum WireCoords {
    Array([f64; 3]),
    Object(WireXyz),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireXyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<WireCoords> for Position {
    fn from(coords: WireCoords) -> Self {
        match coords {
            WireCoords::Array([x, y, z]) => Position::new(x, y, z),
            WireCoords::Object(WireXyz { x, y, z }) => Position::new(x, y, z),
        }
    }
}

impl From<WireBlock> for EntityUpdate {
    fn from(block: WireBlock) -> Self {
        Self {
            kind: EntityKind::from_discriminator(&block.block_type),
            payload: RawPayload(block.block_json),
            position: block.block_coords.into(),
        }
    }
}

impl From<&EntityUpdate> for WireBlock {
    fn from(update: &EntityUpdate) -> Self {
        let Position { x, y, z } = update.position;
        Self {
            block_type: update.kind.discriminator().to_string(),
            block_json: update.payload.0.clone(),
            block_coords: WireCoords::Array([x, y, z]),
        }
    }
}

impl From<&UpdateEnvelope> for WireEnvelope {
    fn from(envelope: &UpdateEnvelope) -> Self {
        Self {
            blocks: envelope.updates.iter().map(WireBlock::from).collect(),
        }
    }
}
