//! Wheel-driven smooth scrolling.
//!
//! The scroll position eases toward a target that wheel input moves. The lerp
//! factor is defined per 60 Hz frame and rescaled for the actual frame gap.

use serde::{Deserialize, Serialize};

const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Position snaps to the target inside this distance (px).
const SNAP_PX: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothScroller {
    /// Fraction of the remaining distance covered per reference frame.
    pub lerp: f64,
    pub wheel_multiplier: f64,
    position: f64,
    target: f64,
    limit: f64,
}

impl Default for SmoothScroller {
    fn default() -> Self {
        Self::new(0.08, 0.8)
    }
}

impl SmoothScroller {
    pub fn new(lerp: f64, wheel_multiplier: f64) -> Self {
        Self {
            lerp: lerp.clamp(0.001, 1.0),
            wheel_multiplier,
            position: 0.0,
            target: 0.0,
            limit: 0.0,
        }
    }

    /// Maximum scroll offset, usually `document_height - viewport height`.
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.target = self.target.clamp(0.0, self.limit);
        self.position = self.position.clamp(0.0, self.limit);
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn on_wheel(&mut self, delta_y: f64) {
        if !delta_y.is_finite() {
            return;
        }
        self.target = (self.target + delta_y * self.wheel_multiplier).clamp(0.0, self.limit);
    }

    /// Jump both position and target, e.g. after an anchor navigation.
    pub fn scroll_to(&mut self, y: f64) {
        let y = y.clamp(0.0, self.limit);
        self.position = y;
        self.target = y;
    }

    /// Advance by `dt_ms`; returns the new position.
    pub fn tick(&mut self, dt_ms: f64) -> f64 {
        if !self.is_animating() {
            return self.position;
        }
        let frames = (dt_ms.max(0.0)) / REFERENCE_FRAME_MS;
        let alpha = 1.0 - (1.0 - self.lerp).powf(frames);
        self.position += (self.target - self.position) * alpha;
        if (self.target - self.position).abs() < SNAP_PX {
            self.position = self.target;
        }
        self.position
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.position != self.target
    }
}
