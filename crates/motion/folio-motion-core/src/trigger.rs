//! Trigger descriptions handed to [`Scheduler::register`](crate::Scheduler::register).

use serde::{Deserialize, Serialize};

use crate::band::{BandEdge, ScrollBand};
use crate::ids::ElementId;
use crate::playback::{PlaybackMode, ToggleActions};
use crate::timeline::TimelineSpec;

/// Band binding for a scroll-driven trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollTriggerSpec {
    pub start: BandEdge,
    pub end: BandEdge,
    /// 0 plays discretely; above 0 scrubs with that many seconds of catch-up lag.
    #[serde(default)]
    pub scrub: f32,
    #[serde(default)]
    pub toggle_actions: ToggleActions,
    /// Discrete only: ignore crossings after the first enter.
    #[serde(default)]
    pub once: bool,
    /// Hold the element in place while the band is active.
    #[serde(default)]
    pub pin: bool,
}

impl ScrollTriggerSpec {
    pub fn new(start: BandEdge, end: BandEdge) -> Self {
        Self {
            start,
            end,
            scrub: 0.0,
            toggle_actions: ToggleActions::default(),
            once: false,
            pin: false,
        }
    }

    pub fn scrub(mut self, lag: f32) -> Self {
        self.scrub = lag;
        self
    }

    pub fn toggle_actions(mut self, actions: ToggleActions) -> Self {
        self.toggle_actions = actions;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn pin(mut self) -> Self {
        self.pin = true;
        self
    }

    pub fn band(&self) -> ScrollBand {
        ScrollBand::new(self.start, self.end)
    }

    pub fn is_scrubbed(&self) -> bool {
        self.scrub > 0.0
    }
}

/// A timeline plus what drives it. Without `scroll` the timeline plays immediately.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationTrigger {
    /// Logical identity used to replace an earlier registration.
    #[serde(default)]
    pub key: Option<String>,
    pub element: ElementId,
    #[serde(default)]
    pub scroll: Option<ScrollTriggerSpec>,
    pub timeline: TimelineSpec,
}

impl AnimationTrigger {
    pub fn scroll(element: ElementId, scroll: ScrollTriggerSpec, timeline: TimelineSpec) -> Self {
        Self {
            key: None,
            element,
            scroll: Some(scroll),
            timeline,
        }
    }

    pub fn immediate(element: ElementId, timeline: TimelineSpec) -> Self {
        Self {
            key: None,
            element,
            scroll: None,
            timeline,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Explicit key, else `"{element}:{start}:{end}"` for scroll triggers.
    /// Immediate triggers without a key have none and are never deduplicated.
    pub fn logical_key(&self) -> Option<String> {
        if let Some(key) = &self.key {
            return Some(key.clone());
        }
        self.scroll
            .as_ref()
            .map(|s| format!("{}:{}:{}", self.element, s.start, s.end))
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        match &self.scroll {
            None => PlaybackMode::Immediate,
            Some(s) if s.is_scrubbed() => PlaybackMode::Scrubbed { lag: s.scrub },
            Some(s) => PlaybackMode::Discrete {
                actions: s.toggle_actions,
                once: s.once,
            },
        }
    }
}
