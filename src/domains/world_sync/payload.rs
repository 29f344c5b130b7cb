use crate::common::{DecodeError, DecodeResult};
use serde::Deserialize;
use std::fmt;

pub const TILE: &str = "tile";
pub const TABLE: &str = "table";

/// Discriminator selecting the payload schema of an entity update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tile,
    Table,
    /// A discriminator this client does not know yet. Skipped, never an error.
    Unknown(String),
}

impl EntityKind {
    pub fn from_discriminator(discriminator: &str) -> Self {
        match discriminator {
            TILE => EntityKind::Tile,
            TABLE => EntityKind::Table,
            other => EntityKind::Unknown(other.to_string()),
        }
    }

    pub fn discriminator(&self) -> &str {
        match self {
            EntityKind::Tile => TILE,
            EntityKind::Table => TABLE,
            EntityKind::Unknown(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EntityKind::Unknown(_))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

/// The nested `block_json` text, kept opaque until its kind is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(pub String);

impl RawPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TilePayload {
    pub color: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct TablePayload {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityPayload {
    Tile(TilePayload),
    Table(TablePayload),
}

impl EntityPayload {
    /// Decodes `raw` with the schema of `kind`. Unknown kinds yield `None`.
    pub fn decode(kind: &EntityKind, raw: &RawPayload) -> DecodeResult<Option<Self>> {
        let payload = match kind {
            EntityKind::Tile => EntityPayload::Tile(decode_schema(kind, raw)?),
            EntityKind::Table => EntityPayload::Table(decode_schema(kind, raw)?),
            EntityKind::Unknown(_) => return Ok(None),
        };
        Ok(Some(payload))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Tile(_) => EntityKind::Tile,
            EntityPayload::Table(_) => EntityKind::Table,
        }
    }
}

fn decode_schema<T: serde::de::DeserializeOwned>(
    kind: &EntityKind,
    raw: &RawPayload,
) -> DecodeResult<T> {
    serde_json::from_str(raw.as_str()).map_err(|e| DecodeError::Payload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}
