use super::envelope::{EntityUpdate, UpdateEnvelope, WireBlock, WireEnvelope};
use crate::common::{DecodeError, DecodeResult};
use serde_json::Value;

/// Decodes one received message into an [`UpdateEnvelope`].
///
/// Decoding is all-or-nothing: a single malformed block rejects the whole
/// message. The nested `block_json` payloads are left opaque.
pub fn decode(raw: &[u8]) -> DecodeResult<UpdateEnvelope> {
    let text = std::str::from_utf8(raw).map_err(|e| DecodeError::InvalidUtf8(e.to_string()))?;
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::Envelope(e.to_string()))?;

    // Derived struct impls also accept sequences, so object shape is checked by hand.
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::Envelope("expected a JSON object".to_string()));
    };
    let blocks = match fields.remove("blocks") {
        Some(Value::Array(blocks)) => blocks,
        Some(_) => return Err(DecodeError::Envelope("`blocks` must be an array".to_string())),
        None => return Err(DecodeError::Envelope("missing field `blocks`".to_string())),
    };

    let updates = blocks
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode_block(index, value))
        .collect::<DecodeResult<Vec<_>>>()?;

    Ok(UpdateEnvelope { updates })
}

fn decode_block(index: usize, value: Value) -> DecodeResult<EntityUpdate> {
    if !value.is_object() {
        return Err(DecodeError::Block {
            index,
            reason: "expected a JSON object".to_string(),
        });
    }
    serde_json::from_value::<WireBlock>(value)
        .map(EntityUpdate::from)
        .map_err(|e| DecodeError::Block {
            index,
            reason: e.to_string(),
        })
}

/// Serializes an envelope back to its wire form, coordinates as arrays.
pub fn encode(envelope: &UpdateEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireEnvelope::from(envelope))
}
