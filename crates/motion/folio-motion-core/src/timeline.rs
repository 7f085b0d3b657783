//! Timelines: ordered property interpolations over a time or progress domain.
//!
//! A [`TimelineSpec`] is the serializable description handed in by a view.
//! [`Timeline::compile`] validates it and lays out one [`Segment`] per
//! (step, target item); stagger offsets apply per item in target order.
//! Sampling is a pure function of time, so scrubbed playback is exactly
//! reversible.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::easing::{lerp, Easing};
use crate::error::{MotionError, TimelineConfigError};
use crate::ids::ElementId;
use crate::value::Property;

/// Where a step starts relative to what is already on the timeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition", into = "RawPosition")]
pub enum StepPosition {
    /// Append at the current end of the timeline (`">"`).
    #[default]
    Sequence,
    /// Absolute time in seconds.
    Absolute(f32),
    /// Offset from the current end of the timeline (`"+=0.2"`, `"-=0.4"`).
    Relative(f32),
    /// Start together with the previous step (`"<"`).
    WithPrevious,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Seconds(f32),
    Label(String),
}

impl TryFrom<RawPosition> for StepPosition {
    type Error = MotionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        match raw {
            RawPosition::Seconds(t) => Ok(StepPosition::Absolute(t)),
            RawPosition::Label(s) => s.parse(),
        }
    }
}

impl From<StepPosition> for RawPosition {
    fn from(pos: StepPosition) -> Self {
        match pos {
            StepPosition::Sequence => RawPosition::Label(">".into()),
            StepPosition::Absolute(t) => RawPosition::Seconds(t),
            StepPosition::Relative(d) if d < 0.0 => RawPosition::Label(format!("-={}", -d)),
            StepPosition::Relative(d) => RawPosition::Label(format!("+={d}")),
            StepPosition::WithPrevious => RawPosition::Label("<".into()),
        }
    }
}

impl std::str::FromStr for StepPosition {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || MotionError::InvalidPosition {
            input: s.to_string(),
        };
        let number = |t: &str| t.trim().parse::<f32>().ok().filter(|v| v.is_finite());
        match s {
            "" | ">" => Ok(StepPosition::Sequence),
            "<" => Ok(StepPosition::WithPrevious),
            _ => {
                if let Some(rest) = s.strip_prefix("+=") {
                    number(rest).map(StepPosition::Relative).ok_or_else(invalid)
                } else if let Some(rest) = s.strip_prefix("-=") {
                    number(rest)
                        .map(|v| StepPosition::Relative(-v))
                        .ok_or_else(invalid)
                } else {
                    number(s).map(StepPosition::Absolute).ok_or_else(invalid)
                }
            }
        }
    }
}

/// Iteration count. Serialized as an integer where `-1` means infinite.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Repeat {
    /// Extra iterations after the first.
    Count(u32),
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(0)
    }
}

impl TryFrom<i64> for Repeat {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Repeat::Infinite),
            n if n >= 0 => u32::try_from(n)
                .map(Repeat::Count)
                .map_err(|_| format!("repeat count {n} out of range")),
            n => Err(format!("repeat must be -1 or a non-negative count, got {n}")),
        }
    }
}

impl From<Repeat> for i64 {
    fn from(r: Repeat) -> Self {
        match r {
            Repeat::Count(n) => i64::from(n),
            Repeat::Infinite => -1,
        }
    }
}

/// One property interpolation applied to a batch of items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    /// Items animated by this step, in stagger order. Empty means the trigger element.
    #[serde(default)]
    pub targets: Vec<ElementId>,
    pub property: Property,
    pub from: f32,
    pub to: f32,
    /// Seconds; falls back to `Config::default_step_duration`.
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub position: StepPosition,
    /// Delay added per item, in target order.
    #[serde(default)]
    pub stagger: f32,
}

impl TimelineStep {
    pub fn new(property: impl Into<Property>, from: f32, to: f32) -> Self {
        Self {
            targets: Vec::new(),
            property: property.into(),
            from,
            to,
            duration: None,
            easing: Easing::Linear,
            position: StepPosition::Sequence,
            stagger: 0.0,
        }
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = ElementId>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn at(mut self, position: StepPosition) -> Self {
        self.position = position;
        self
    }

    pub fn stagger(mut self, seconds: f32) -> Self {
        self.stagger = seconds;
        self
    }
}

/// Serializable timeline description.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpec {
    pub steps: Vec<TimelineStep>,
    /// Seconds before the first iteration (clocked playback only).
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub repeat_delay: f32,
    #[serde(default)]
    pub yoyo: bool,
    /// Immediate timelines created paused wait for an explicit `Play`.
    #[serde(default)]
    pub paused: bool,
}

impl TimelineSpec {
    pub fn new(steps: Vec<TimelineStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds;
        self
    }

    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }

    pub fn is_infinite(&self) -> bool {
        self.repeat == Repeat::Infinite
    }
}

/// A laid-out interpolation for one item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub target: ElementId,
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
    pub start: f32,
    pub end: f32,
}

impl Segment {
    #[inline]
    fn value_at(&self, t: f32, at_end: bool) -> f32 {
        let len = self.end - self.start;
        let u = if len > 0.0 {
            ((t - self.start) / len).clamp(0.0, 1.0)
        } else if t > self.start || at_end {
            1.0
        } else {
            0.0
        };
        lerp(self.from, self.to, self.easing.apply(u))
    }
}

/// Value of one channel at a sampled time.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub element: ElementId,
    pub property: Property,
    pub value: f32,
}

/// Position of a clocked timeline inside its iteration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cursor {
    /// Time inside the current iteration, `0..=duration`.
    pub time: f32,
    /// True when `time` is the iteration end (zero-length steps count as done).
    pub at_end: bool,
    /// True once every iteration has played (never for infinite timelines).
    pub finished: bool,
}

/// Compiled, validated timeline.
#[derive(Clone, Debug)]
pub struct Timeline {
    segments: Vec<Segment>,
    /// (element, property) → segment indices ordered by start time.
    channels: IndexMap<(ElementId, Property), Vec<usize>>,
    duration: f32,
    delay: f32,
    repeat: Repeat,
    repeat_delay: f32,
    yoyo: bool,
    paused: bool,
}

impl Timeline {
    /// Validate `spec` and lay out its segments. Steps with no targets animate `element`.
    pub fn compile(
        spec: &TimelineSpec,
        element: ElementId,
        cfg: &Config,
    ) -> Result<Self, MotionError> {
        if spec.steps.is_empty() {
            return Err(TimelineConfigError::EmptySteps.into());
        }
        for delay in [spec.delay, spec.repeat_delay] {
            if !delay.is_finite() || delay < 0.0 {
                return Err(TimelineConfigError::NegativeDelay { delay }.into());
            }
        }

        let mut segments = Vec::new();
        let mut timeline_end = 0.0f32;
        let mut prev_start: Option<f32> = None;

        for (i, step) in spec.steps.iter().enumerate() {
            let duration = step.duration.unwrap_or(cfg.default_step_duration);
            for (field, v) in [
                ("from", step.from),
                ("to", step.to),
                ("duration", duration),
                ("stagger", step.stagger),
            ] {
                if !v.is_finite() {
                    return Err(TimelineConfigError::NonFinite {
                        step: i,
                        field: field.to_string(),
                    }
                    .into());
                }
            }
            if duration < 0.0 {
                return Err(TimelineConfigError::NegativeDuration { step: i, duration }.into());
            }
            if step.stagger < 0.0 {
                return Err(TimelineConfigError::NegativeStagger {
                    step: i,
                    stagger: step.stagger,
                }
                .into());
            }

            let step_start = match step.position {
                StepPosition::Sequence => timeline_end,
                StepPosition::Absolute(t) => t.max(0.0),
                StepPosition::Relative(d) => (timeline_end + d).max(0.0),
                StepPosition::WithPrevious => {
                    prev_start.ok_or(TimelineConfigError::UnknownPosition { step: i })?
                }
            };

            let targets: &[ElementId] = if step.targets.is_empty() {
                std::slice::from_ref(&element)
            } else {
                &step.targets
            };
            for (k, target) in targets.iter().enumerate() {
                let start = step_start + k as f32 * step.stagger;
                segments.push(Segment {
                    target: *target,
                    property: step.property.clone(),
                    from: step.from,
                    to: step.to,
                    easing: step.easing,
                    start,
                    end: start + duration,
                });
            }
            let step_end = step_start + (targets.len() - 1) as f32 * step.stagger + duration;
            timeline_end = timeline_end.max(step_end);
            prev_start = Some(step_start);
        }

        let mut channels: IndexMap<(ElementId, Property), Vec<usize>> = IndexMap::new();
        for (idx, seg) in segments.iter().enumerate() {
            channels
                .entry((seg.target, seg.property.clone()))
                .or_default()
                .push(idx);
        }
        for indices in channels.values_mut() {
            // stable: equal starts keep declaration order
            indices.sort_by(|a, b| segments[*a].start.total_cmp(&segments[*b].start));
        }

        Ok(Self {
            segments,
            channels,
            duration: timeline_end,
            delay: spec.delay,
            repeat: spec.repeat,
            repeat_delay: spec.repeat_delay,
            yoyo: spec.yoyo,
            paused: spec.paused,
        })
    }

    /// Length of one iteration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    #[inline]
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.repeat == Repeat::Infinite
    }

    #[inline]
    pub fn starts_paused(&self) -> bool {
        self.paused
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct animated elements in first-appearance order.
    pub fn targets(&self) -> Vec<ElementId> {
        let mut out: Vec<ElementId> = Vec::new();
        for (element, _) in self.channels.keys() {
            if !out.contains(element) {
                out.push(*element);
            }
        }
        out
    }

    /// Delay plus every iteration; `None` for infinite timelines.
    pub fn total_duration(&self) -> Option<f32> {
        match self.repeat {
            Repeat::Infinite => None,
            Repeat::Count(n) => {
                let n = n as f32;
                Some(self.delay + self.duration * (n + 1.0) + self.repeat_delay * n)
            }
        }
    }

    /// The reduced-motion variant: one forward pass, no repeat, no yoyo.
    pub fn single_pass(&self) -> Self {
        Self {
            repeat: Repeat::Count(0),
            yoyo: false,
            ..self.clone()
        }
    }

    /// Sample every channel at iteration time `t`.
    pub fn sample_at(&self, t: f32, at_end: bool) -> Vec<Sample> {
        let mut out = Vec::with_capacity(self.channels.len());
        for ((element, property), indices) in &self.channels {
            let mut current: Option<&Segment> = None;
            for idx in indices {
                let seg = &self.segments[*idx];
                if seg.start <= t {
                    current = Some(seg);
                } else {
                    break;
                }
            }
            let value = match current {
                Some(seg) => seg.value_at(t, at_end),
                // nothing started yet: hold the earliest `from`
                None => self.segments[indices[0]].from,
            };
            out.push(Sample {
                element: *element,
                property: property.clone(),
                value,
            });
        }
        out
    }

    /// Sample at normalized progress `p` (clamped). Pure: equal `p` gives equal output.
    pub fn sample_progress(&self, p: f32) -> Vec<Sample> {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.sample_at(p * self.duration, p >= 1.0)
    }

    /// Map clock time since start (seconds, delay included) to an iteration cursor.
    pub fn local_time(&self, elapsed: f32) -> Cursor {
        let d = self.duration;
        let e = elapsed - self.delay;
        if e <= 0.0 {
            return Cursor {
                time: 0.0,
                at_end: d <= 0.0 && e == 0.0 && elapsed > 0.0,
                finished: false,
            };
        }

        let cycle = d + self.repeat_delay;
        if let Repeat::Count(n) = self.repeat {
            let total = d * (n as f32 + 1.0) + self.repeat_delay * n as f32;
            if e >= total {
                let time = if self.yoyo && n % 2 == 1 { 0.0 } else { d };
                return Cursor {
                    time,
                    at_end: time >= d,
                    finished: true,
                };
            }
        }
        if cycle <= 0.0 {
            return Cursor {
                time: d,
                at_end: true,
                finished: false,
            };
        }

        let iteration = (e / cycle).floor();
        let within = (e - iteration * cycle).min(d);
        let time = if self.yoyo && (iteration as u64) % 2 == 1 {
            d - within
        } else {
            within
        };
        Cursor {
            time,
            at_end: time >= d,
            finished: false,
        }
    }
}
