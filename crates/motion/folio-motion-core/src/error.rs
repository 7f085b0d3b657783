//! Error types for trigger registration and spec parsing.
//!
//! Only programmer errors live here. Missing host capabilities and absent
//! elements are degradations (see [`Degradation`]) and never surface as `Err`.

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;

/// Errors returned to the caller that registers a trigger or parses a spec.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionError {
    /// The timeline steps do not describe a playable timeline.
    #[error("Invalid timeline config: {reason}")]
    InvalidTimelineConfig { reason: TimelineConfigError },

    /// A band edge such as `"top 70%"` could not be parsed.
    #[error("Invalid band edge: {input:?}")]
    InvalidBand { input: String },

    /// Unknown easing name.
    #[error("Invalid easing: {input:?}")]
    InvalidEasing { input: String },

    /// Toggle actions must name four known actions.
    #[error("Invalid toggle actions: {input:?}")]
    InvalidToggleActions { input: String },

    /// Step position shorthand such as `"-=0.4"` could not be parsed.
    #[error("Invalid step position: {input:?}")]
    InvalidPosition { input: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

/// Detail for [`MotionError::InvalidTimelineConfig`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimelineConfigError {
    #[error("timeline has no steps")]
    EmptySteps,
    #[error("step {step} has negative duration {duration}")]
    NegativeDuration { step: usize, duration: f32 },
    #[error("step {step} has negative stagger {stagger}")]
    NegativeStagger { step: usize, stagger: f32 },
    #[error("negative delay {delay}")]
    NegativeDelay { delay: f32 },
    #[error("step {step} has a non-finite {field}")]
    NonFinite { step: usize, field: String },
    #[error("step {step} is positioned relative to a previous step that does not exist")]
    UnknownPosition { step: usize },
}

impl From<TimelineConfigError> for MotionError {
    fn from(reason: TimelineConfigError) -> Self {
        Self::InvalidTimelineConfig { reason }
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

impl MotionError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTimelineConfig { .. } => "timeline",
            Self::InvalidBand { .. }
            | Self::InvalidEasing { .. }
            | Self::InvalidToggleActions { .. }
            | Self::InvalidPosition { .. } => "parse",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// Whether the caller can retry with the same input after fixing host state.
    /// Every variant here is a configuration bug, so none are.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Recovered capability gaps. These downgrade a handle to inert instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// A host capability (geometry, frames, paint observer, ...) is missing.
    EnvironmentUnavailable { capability: Capability },
    /// The trigger element is not in the render tree.
    TargetNotFound { element: ElementId },
    /// Reduce-motion preference turned a looping timeline into a static one.
    ReducedMotion,
}

/// Host capabilities the coordination layer consumes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Geometry,
    ScrollEvents,
    AnimationFrame,
    Timers,
    LargestPaint,
}
