//! User-media constraints and camera facing selection

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Camera facing direction on devices with more than one camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera, facing the environment
    Environment,
}

impl FacingMode {
    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    /// Constraint value
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl Default for FacingMode {
    fn default() -> Self {
        FacingMode::User
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint for one track kind: a flag or a constraint object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackConstraint {
    /// Request (`true`) or refuse (`false`) the track with default settings
    Enabled(bool),
    /// Request the track with specific settings
    Constraints(Map<String, Value>),
}

impl TrackConstraint {
    /// Video constraint selecting a camera by facing
    pub fn facing(mode: FacingMode) -> Self {
        let mut map = Map::new();
        map.insert("facingMode".to_string(), Value::String(mode.as_str().to_string()));
        TrackConstraint::Constraints(map)
    }

    /// Interpret an arbitrary JSON setting as a constraint
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(enabled) => Some(TrackConstraint::Enabled(*enabled)),
            Value::Object(map) => Some(TrackConstraint::Constraints(map.clone())),
            _ => None,
        }
    }

    /// Facing mode carried by this constraint, if any
    pub fn facing_mode(&self) -> Option<FacingMode> {
        match self {
            TrackConstraint::Constraints(map) => map
                .get("facingMode")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            TrackConstraint::Enabled(_) => None,
        }
    }
}

/// Request handed to the device layer.
///
/// Unset fields are left out entirely so the device layer applies its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConstraints {
    /// Audio constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<TrackConstraint>,
    /// Video constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<TrackConstraint>,
    /// Frame rate hint, passed through as configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<Value>,
}

impl MediaConstraints {
    /// Create empty constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the video constraint
    pub fn with_video(mut self, video: TrackConstraint) -> Self {
        self.video = Some(video);
        self
    }

    /// Overlay another set of constraints, its set fields win
    pub fn overlay(mut self, other: MediaConstraints) -> Self {
        if other.audio.is_some() {
            self.audio = other.audio;
        }
        if other.video.is_some() {
            self.video = other.video;
        }
        if other.frame_rate.is_some() {
            self.frame_rate = other.frame_rate;
        }
        self
    }

    /// Pretty JSON rendering for log lines
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Camera selection the user controls.
///
/// Only tracks a facing mode when the device layer supports the
/// `facingMode` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraintState {
    facing_mode: Option<FacingMode>,
}

impl MediaConstraintState {
    /// Start on the front camera when facing mode is supported
    pub fn new(facing_mode_supported: bool) -> Self {
        Self {
            facing_mode: facing_mode_supported.then(FacingMode::default),
        }
    }

    /// Current facing mode, `None` when unsupported
    pub fn facing_mode(&self) -> Option<FacingMode> {
        self.facing_mode
    }

    /// Whether the facing mode can be toggled
    pub fn supports_facing_mode(&self) -> bool {
        self.facing_mode.is_some()
    }

    /// Switch cameras, returning the new facing mode
    pub fn toggle(&mut self) -> Option<FacingMode> {
        if let Some(mode) = self.facing_mode {
            let next = mode.toggled();
            debug!("Facing mode changed: {} -> {}", mode, next);
            self.facing_mode = Some(next);
        }
        self.facing_mode
    }

    /// Video constraint for the current selection.
    ///
    /// Without facing support any camera will do.
    pub fn video_constraint(&self) -> TrackConstraint {
        match self.facing_mode {
            Some(mode) => TrackConstraint::facing(mode),
            None => TrackConstraint::Enabled(true),
        }
    }
}
