//! Core configuration for folio-motion-core.

use serde::{Deserialize, Serialize};

/// Tunables for the scheduler, the deferred gate and the vitals recorder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on how long the deferred gate waits for a largest-paint notification.
    pub fallback_paint_ms: u32,

    /// Duration (seconds) for steps that omit one.
    pub default_step_duration: f32,

    /// Frame gaps above this are clamped so a backgrounded tab does not jump timelines.
    pub max_frame_dt_ms: f64,

    /// Scrub catch-up snaps to the tracked progress inside this distance.
    pub scrub_snap_epsilon: f32,

    /// How looping timelines are presented when the host prefers reduced motion.
    pub reduced_motion: ReducedMotionPolicy,

    /// Events retained per frame. Band crossings beyond it are dropped with a
    /// warning; lifecycle events are always kept.
    pub max_events_per_frame: usize,

    /// Delay before collected web vitals are considered final.
    pub report_vitals_after_ms: u32,
}

/// Presentation of `repeat: infinite` timelines under the reduce-motion preference.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReducedMotionPolicy {
    /// Never start the timeline; the element keeps its resting style.
    Static,
    /// Run one forward pass (no repeat, no yoyo), at most once.
    #[default]
    SinglePass,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_paint_ms: 300,
            default_step_duration: 0.5,
            max_frame_dt_ms: 100.0,
            scrub_snap_epsilon: 1e-4,
            reduced_motion: ReducedMotionPolicy::default(),
            max_events_per_frame: 1024,
            report_vitals_after_ms: 5000,
        }
    }
}
