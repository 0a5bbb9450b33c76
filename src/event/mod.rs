use serde::Deserialize;

mod decode;

pub use decode::{decode_event, DecodeError};

/// Raw message published by Frigate on its events topic.
///
/// Frigate sends the tracked object's state before and after each change;
/// only the fields needed for notification decisions are kept.
#[derive(Clone, Debug, Deserialize)]
pub struct FrigateMessage {
    #[serde(default)]
    pub before: Option<ObjectState>,

    #[serde(default)]
    pub after: Option<ObjectState>,
}

/// One side of a Frigate state transition
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObjectState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub has_snapshot: Option<bool>,
}

/// A single detection, reduced from a before/after transition.
///
/// Produced once per broker message and dropped after dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionEvent {
    pub camera: String,
    pub label: String,
    pub had_snapshot_before: bool,
    pub has_snapshot_now: bool,
    /// Frigate event id, used to build snapshot and clip links
    pub id: String,
}

impl DetectionEvent {
    /// True when this transition is the one where a snapshot first became available.
    pub fn is_notification_worthy(&self) -> bool {
        !self.had_snapshot_before && self.has_snapshot_now
    }
}
