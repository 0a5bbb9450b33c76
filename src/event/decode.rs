use super::{DetectionEvent, FrigateMessage};
use std::fmt;

/// Errors turning a broker payload into a DetectionEvent
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    InvalidJson(String),
    MissingAfter,
    MissingField(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidJson(e) => write!(f, "payload is not a valid event document: {}", e),
            DecodeError::MissingAfter => write!(f, "event has no 'after' state"),
            DecodeError::MissingField(field) => write!(f, "'after' state is missing '{}'", field),
        }
    }
}

impl std::error::Error for DecodeError {}

impl DecodeError {
    /// Incomplete but well-formed documents, as opposed to garbage payloads.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, DecodeError::MissingAfter | DecodeError::MissingField(_))
    }
}

/// Decodes a raw events-topic payload.
///
/// Rules:
/// - Payload must be a JSON object with an `after` state
/// - `after` must carry `camera`, `label` and `id`
/// - Missing `has_snapshot` (or a missing `before`) counts as false
pub fn decode_event(payload: &[u8]) -> Result<DetectionEvent, DecodeError> {
    let message: FrigateMessage = serde_json::from_slice(payload)
        .map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let after = message.after.ok_or(DecodeError::MissingAfter)?;
    let had_snapshot_before = message
        .before
        .and_then(|before| before.has_snapshot)
        .unwrap_or(false);

    Ok(DetectionEvent {
        camera: after.camera.ok_or(DecodeError::MissingField("camera"))?,
        label: after.label.ok_or(DecodeError::MissingField("label"))?,
        id: after.id.ok_or(DecodeError::MissingField("id"))?,
        had_snapshot_before,
        has_snapshot_now: after.has_snapshot.unwrap_or(false),
    })
}
