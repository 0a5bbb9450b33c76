use crate::config::FilterConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Why an event was withheld
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionReason {
    /// Camera listed with no objects: everything on it is muted
    CameraDisabled,
    ObjectDisabledForCamera,
    ObjectDisabledGlobally,
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressionReason::CameraDisabled => write!(f, "camera disabled"),
            SuppressionReason::ObjectDisabledForCamera => write!(f, "object disabled for camera"),
            SuppressionReason::ObjectDisabledGlobally => write!(f, "object disabled globally"),
        }
    }
}

/// Per-camera and global object suppression.
///
/// All names are lowercased on construction and lookup, so matching is
/// case-insensitive. Built once from config; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SuppressionPolicy {
    disabled_cameras: BTreeMap<String, BTreeSet<String>>,
    disabled_objects: BTreeSet<String>,
}

impl SuppressionPolicy {
    /// Normalize the filter section.
    ///
    /// A camera listed twice keeps its last entry.
    pub fn from_config(filters: &FilterConfig) -> Self {
        let disabled_cameras: BTreeMap<String, BTreeSet<String>> = filters
            .disabled_cameras
            .iter()
            .map(|camera| {
                let objects = camera
                    .disabled_objects
                    .iter()
                    .map(|o| o.to_lowercase())
                    .collect();
                (camera.camera_name.to_lowercase(), objects)
            })
            .collect();

        let disabled_objects: BTreeSet<String> = filters
            .disabled_objects
            .iter()
            .map(|o| o.to_lowercase())
            .collect();

        debug!(?disabled_cameras, "Disabled cameras");
        debug!(?disabled_objects, "Disabled objects");

        Self {
            disabled_cameras,
            disabled_objects,
        }
    }

    /// True when no notification may be sent for `label` seen on `camera`.
    pub fn should_suppress(&self, camera: &str, label: &str) -> bool {
        self.suppression_reason(camera, label).is_some()
    }

    /// First matching rule, checking the camera entry before the global list.
    pub fn suppression_reason(&self, camera: &str, label: &str) -> Option<SuppressionReason> {
        let camera = camera.to_lowercase();
        let label = label.to_lowercase();

        if let Some(objects) = self.disabled_cameras.get(&camera) {
            if objects.is_empty() {
                return Some(SuppressionReason::CameraDisabled);
            }
            if objects.contains(&label) {
                return Some(SuppressionReason::ObjectDisabledForCamera);
            }
        }

        if self.disabled_objects.contains(&label) {
            return Some(SuppressionReason::ObjectDisabledGlobally);
        }

        None
    }
}
