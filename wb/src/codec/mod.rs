//! Payload codec
//!
//! Converts between raw transport payloads and typed [`WalkEvent`]s. Payloads
//! are compact JSON objects whose keys are exactly the wire fields of the
//! event variant:
//!
//! | Topic         | Fields                                   |
//! |---------------|------------------------------------------|
//! | `/walk/start` | `startEpochMs`, `intensity`              |
//! | `/walk/end`   | `endEpochMs`, `durationSec`, `intensity` |
//!
//! Pure and stateless; no I/O.

mod error;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{Topic, WalkEvent};

pub use error::DecodeError;

pub const START_EPOCH_MS: &str = "startEpochMs";
pub const END_EPOCH_MS: &str = "endEpochMs";
pub const DURATION_SEC: &str = "durationSec";
pub const INTENSITY: &str = "intensity";

/// Serialize an event to its wire payload
pub fn encode(event: &WalkEvent) -> Vec<u8> {
    debug!(topic = %event.topic(), "encode: called");
    event.method_args().to_string().into_bytes()
}

/// Parse a wire payload received under `topic`
///
/// Extra keys are ignored. A key that is present but `null` counts as missing.
pub fn decode(topic: &str, bytes: &[u8]) -> Result<WalkEvent, DecodeError> {
    debug!(%topic, len = bytes.len(), "decode: called");
    let topic: Topic = topic.parse()?;

    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    let value: Value = serde_json::from_str(text).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::MalformedPayload("expected a JSON object".to_string()));
    };

    let event = match topic {
        Topic::WalkStart => WalkEvent::WalkStarted {
            start_time: epoch_ms(&fields, START_EPOCH_MS)?,
            intensity: intensity(&fields)?,
        },
        Topic::WalkEnd => WalkEvent::WalkEnded {
            end_time: epoch_ms(&fields, END_EPOCH_MS)?,
            duration_seconds: duration_sec(&fields)?,
            intensity: intensity(&fields)?,
        },
    };

    debug!(?event, "decode: parsed event");
    Ok(event)
}

fn field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, DecodeError> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn epoch_ms(fields: &Map<String, Value>, name: &'static str) -> Result<u64, DecodeError> {
    // as_u64 rejects negatives and fractional numbers
    field(fields, name)?.as_u64().ok_or(DecodeError::MalformedValue(name))
}

fn duration_sec(fields: &Map<String, Value>) -> Result<u32, DecodeError> {
    field(fields, DURATION_SEC)?
        .as_u64()
        .and_then(|secs| u32::try_from(secs).ok())
        .ok_or(DecodeError::MalformedValue(DURATION_SEC))
}

/// Intensity is opaque; only the empty string is refused
fn intensity(fields: &Map<String, Value>) -> Result<String, DecodeError> {
    match field(fields, INTENSITY)?.as_str() {
        Some(label) if !label.is_empty() => Ok(label.to_string()),
        _ => Err(DecodeError::MalformedValue(INTENSITY)),
    }
}
