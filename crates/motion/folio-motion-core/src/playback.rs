//! Visibility-gated playback of a compiled [`Timeline`].
//!
//! A [`GatedTimeline`] is fed the raw band progress of its trigger element
//! once per frame. Scrubbed playback follows progress (optionally lagged);
//! discrete playback reacts to band crossings with toggle actions and runs
//! its own clock; immediate playback only has the clock.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::easing::lerp;
use crate::error::MotionError;
use crate::timeline::{Repeat, Sample, Timeline};

/// What a crossing does to a discrete timeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    #[default]
    None,
    Play,
    Pause,
    Resume,
    Reverse,
    Restart,
    Reset,
    Complete,
}

impl ToggleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleAction::None => "none",
            ToggleAction::Play => "play",
            ToggleAction::Pause => "pause",
            ToggleAction::Resume => "resume",
            ToggleAction::Reverse => "reverse",
            ToggleAction::Restart => "restart",
            ToggleAction::Reset => "reset",
            ToggleAction::Complete => "complete",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        Some(match token {
            "none" => ToggleAction::None,
            "play" => ToggleAction::Play,
            "pause" => ToggleAction::Pause,
            "resume" => ToggleAction::Resume,
            "reverse" => ToggleAction::Reverse,
            "restart" => ToggleAction::Restart,
            "reset" => ToggleAction::Reset,
            "complete" => ToggleAction::Complete,
            _ => return None,
        })
    }
}

impl FromStr for ToggleAction {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s.trim()).ok_or_else(|| MotionError::InvalidToggleActions {
            input: s.to_string(),
        })
    }
}

/// Actions for enter, leave, enter-back and leave-back, written `"play none none reverse"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::None,
            on_enter_back: ToggleAction::None,
            on_leave_back: ToggleAction::None,
        }
    }
}

impl ToggleActions {
    pub fn for_crossing(&self, crossing: Crossing) -> ToggleAction {
        match crossing {
            Crossing::Enter => self.on_enter,
            Crossing::Leave => self.on_leave,
            Crossing::EnterBack => self.on_enter_back,
            Crossing::LeaveBack => self.on_leave_back,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::InvalidToggleActions {
            input: s.to_string(),
        };
        let parsed: Vec<ToggleAction> = s
            .split_whitespace()
            .map(|t| ToggleAction::parse_token(t).ok_or_else(invalid))
            .collect::<Result<_, _>>()?;
        match parsed.as_slice() {
            &[on_enter, on_leave, on_enter_back, on_leave_back] => Ok(Self {
                on_enter,
                on_leave,
                on_enter_back,
                on_leave_back,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter.as_str(),
            self.on_leave.as_str(),
            self.on_enter_back.as_str(),
            self.on_leave_back.as_str()
        )
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ToggleActions> for String {
    fn from(actions: ToggleActions) -> Self {
        actions.to_string()
    }
}

/// Where the scroll position sits relative to a band.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Before,
    Inside,
    After,
}

impl Region {
    #[inline]
    pub fn from_raw(raw: f32) -> Self {
        if raw < 0.0 {
            Region::Before
        } else if raw > 1.0 {
            Region::After
        } else {
            Region::Inside
        }
    }

    /// Crossings passed when moving from `from` to `to`. A first observation
    /// (`from == None`) counts as coming from `Before`.
    pub fn crossings(from: Option<Region>, to: Region) -> &'static [Crossing] {
        use Crossing::*;
        match (from.unwrap_or(Region::Before), to) {
            (Region::Before, Region::Inside) => &[Enter],
            (Region::Before, Region::After) => &[Enter, Leave],
            (Region::Inside, Region::After) => &[Leave],
            (Region::Inside, Region::Before) => &[LeaveBack],
            (Region::After, Region::Inside) => &[EnterBack],
            (Region::After, Region::Before) => &[EnterBack, LeaveBack],
            _ => &[],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PlaybackMode {
    /// Output follows band progress; `lag` seconds of catch-up smoothing.
    Scrubbed { lag: f32 },
    /// Own clock, driven by crossings.
    Discrete { actions: ToggleActions, once: bool },
    /// Own clock, started by the scheduler. No band.
    Immediate,
}

/// What one [`GatedTimeline::update`] produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    /// Values to commit, when the output changed.
    pub samples: Option<Vec<Sample>>,
    pub crossings: Vec<Crossing>,
    /// The clock reached the end of its last iteration.
    pub completed: bool,
    pub pin_changed: Option<bool>,
}

#[derive(Copy, Clone, Debug)]
struct Clock {
    elapsed: f32,
    direction: f32,
    playing: bool,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            direction: 1.0,
            playing: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GatedTimeline {
    timeline: Timeline,
    mode: PlaybackMode,
    pin: bool,
    snap_epsilon: f32,
    region: Option<Region>,
    displayed: Option<f32>,
    scrub_target: f32,
    clock: Clock,
    dirty: bool,
    pending_complete: bool,
    pinned: bool,
    /// Crossings stop driving the clock after the first enter.
    crossings_locked: bool,
    /// Single-pass timelines refuse to start a second run.
    run_once: bool,
    has_run: bool,
}

impl GatedTimeline {
    pub fn new(timeline: Timeline, mode: PlaybackMode, pin: bool, snap_epsilon: f32) -> Self {
        Self {
            timeline,
            mode,
            pin,
            snap_epsilon,
            region: None,
            displayed: None,
            scrub_target: 0.0,
            clock: Clock::default(),
            dirty: true,
            pending_complete: false,
            pinned: false,
            crossings_locked: false,
            run_once: false,
            has_run: false,
        }
    }

    /// Limit playback to one run (reduced motion).
    pub fn with_run_once(mut self) -> Self {
        self.run_once = true;
        if let PlaybackMode::Discrete { once, .. } = &mut self.mode {
            *once = true;
        }
        self
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn is_playing(&self) -> bool {
        self.clock.playing
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Progress currently shown by a scrubbed timeline.
    pub fn displayed_progress(&self) -> Option<f32> {
        self.displayed
    }

    /// True while another frame would change the output.
    pub fn is_animating(&self) -> bool {
        match self.mode {
            PlaybackMode::Scrubbed { .. } => self.displayed != Some(self.scrub_target),
            _ => self.clock.playing,
        }
    }

    /// Move the clock to `elapsed` seconds (delay included) without changing play state.
    pub fn seek(&mut self, elapsed: f32) {
        self.clock.elapsed = elapsed.max(0.0);
        self.dirty = true;
    }

    fn end_time(&self) -> f32 {
        match self.timeline.total_duration() {
            Some(total) => total,
            None => self.timeline.delay() + self.timeline.duration(),
        }
    }

    /// Apply a toggle action to the clock. Returns false when it was ignored.
    pub fn apply(&mut self, action: ToggleAction) -> bool {
        if matches!(self.mode, PlaybackMode::Scrubbed { .. }) {
            return false;
        }
        let starts_run = matches!(
            action,
            ToggleAction::Play
                | ToggleAction::Resume
                | ToggleAction::Reverse
                | ToggleAction::Restart
                | ToggleAction::Reset
        );
        if self.run_once && self.has_run && starts_run {
            return false;
        }
        let end = self.end_time();
        let clock = &mut self.clock;
        match action {
            ToggleAction::None => return false,
            ToggleAction::Play => {
                clock.direction = 1.0;
                clock.playing = true;
            }
            ToggleAction::Pause => clock.playing = false,
            ToggleAction::Resume => clock.playing = true,
            ToggleAction::Reverse => {
                clock.direction = -1.0;
                clock.playing = true;
            }
            ToggleAction::Restart => {
                clock.elapsed = 0.0;
                clock.direction = 1.0;
                clock.playing = true;
            }
            ToggleAction::Reset => {
                clock.elapsed = 0.0;
                clock.direction = 1.0;
                clock.playing = false;
            }
            ToggleAction::Complete => {
                clock.elapsed = end;
                clock.direction = 1.0;
                clock.playing = false;
                self.pending_complete = true;
            }
        }
        if self.clock.playing && self.clock.direction > 0.0 {
            self.has_run = true;
        }
        self.dirty = true;
        true
    }

    fn advance(&mut self, dt: f32) -> bool {
        if !self.clock.playing || dt <= 0.0 {
            return false;
        }
        let end = self.end_time();
        let finite = self.timeline.repeat() != Repeat::Infinite;
        let clock = &mut self.clock;
        clock.elapsed += clock.direction * dt;
        self.dirty = true;
        if clock.direction < 0.0 && clock.elapsed <= 0.0 {
            clock.elapsed = 0.0;
            clock.playing = false;
        } else if finite && clock.direction > 0.0 && clock.elapsed >= end {
            clock.elapsed = end;
            clock.playing = false;
            return true;
        }
        false
    }

    /// Feed one frame: `raw` is the unclamped band progress (None without a band), `dt` in seconds.
    pub fn update(&mut self, raw: Option<f32>, dt: f32) -> Update {
        let mut out = Update::default();

        if let Some(raw) = raw {
            let next = Region::from_raw(raw);
            let crossings = Region::crossings(self.region, next);
            self.region = Some(next);
            for &crossing in crossings {
                out.crossings.push(crossing);
                if self.pin {
                    let pinned = matches!(crossing, Crossing::Enter | Crossing::EnterBack);
                    if pinned != self.pinned {
                        self.pinned = pinned;
                        out.pin_changed = Some(pinned);
                    }
                }
                if let PlaybackMode::Discrete { actions, once } = self.mode {
                    if !self.crossings_locked {
                        self.apply(actions.for_crossing(crossing));
                        if once && crossing == Crossing::Enter {
                            self.crossings_locked = true;
                        }
                    }
                }
            }
        }

        match self.mode {
            PlaybackMode::Scrubbed { lag } => {
                let target = raw.map_or(0.0, |r| r.clamp(0.0, 1.0));
                self.scrub_target = target;
                let next = match self.displayed {
                    None => target,
                    Some(shown) => {
                        let alpha = if lag <= 0.0 { 1.0 } else { (dt / lag).min(1.0) };
                        let v = lerp(shown, target, alpha);
                        if (v - target).abs() <= self.snap_epsilon {
                            target
                        } else {
                            v
                        }
                    }
                };
                if self.displayed != Some(next) || self.dirty {
                    self.displayed = Some(next);
                    self.dirty = false;
                    out.samples = Some(self.timeline.sample_progress(next));
                }
            }
            PlaybackMode::Discrete { .. } | PlaybackMode::Immediate => {
                if self.advance(dt) {
                    self.pending_complete = true;
                }
                if self.dirty {
                    self.dirty = false;
                    let cursor = self.timeline.local_time(self.clock.elapsed);
                    out.samples = Some(self.timeline.sample_at(cursor.time, cursor.at_end));
                }
                out.completed = std::mem::take(&mut self.pending_complete);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ids::ElementId;
    use crate::timeline::{TimelineSpec, TimelineStep};

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn slide(duration: f32) -> Timeline {
        let spec = TimelineSpec::new(vec![TimelineStep::new("y", 150.0, 0.0).duration(duration)]);
        Timeline::compile(&spec, ElementId(1), &Config::default()).unwrap()
    }

    fn y(update: &Update) -> f32 {
        update.samples.as_ref().expect("samples")[0].value
    }

    #[test]
    fn toggle_actions_parse() {
        let a: ToggleActions = "restart none none reverse".parse().unwrap();
        assert_eq!(a.on_enter, ToggleAction::Restart);
        assert_eq!(a.on_leave_back, ToggleAction::Reverse);
        assert_eq!(a.to_string(), "restart none none reverse");
        assert!("play none".parse::<ToggleActions>().is_err());
        assert!("play none none jump".parse::<ToggleActions>().is_err());
        assert_eq!(ToggleActions::default().to_string(), "play none none none");
    }

    #[test]
    fn jumps_emit_both_crossings() {
        assert_eq!(
            Region::crossings(Some(Region::Before), Region::After),
            &[Crossing::Enter, Crossing::Leave]
        );
        assert_eq!(
            Region::crossings(Some(Region::After), Region::Before),
            &[Crossing::EnterBack, Crossing::LeaveBack]
        );
        assert!(Region::crossings(None, Region::Before).is_empty());
        assert!(Region::crossings(Some(Region::Inside), Region::Inside).is_empty());
    }

    #[test]
    fn scrub_without_lag_is_pure() {
        let mut gt = GatedTimeline::new(slide(1.0), PlaybackMode::Scrubbed { lag: 0.0 }, false, 1e-4);
        approx(y(&gt.update(Some(0.0), 0.016)), 150.0, 1e-4);
        approx(y(&gt.update(Some(0.5), 0.016)), 75.0, 1e-4);
        approx(y(&gt.update(Some(1.0), 0.016)), 0.0, 1e-4);
        // unchanged progress writes nothing
        assert!(gt.update(Some(1.0), 0.016).samples.is_none());
        approx(y(&gt.update(Some(0.5), 0.016)), 75.0, 1e-4);
    }

    #[test]
    fn scrub_lag_catches_up() {
        let mut gt = GatedTimeline::new(slide(1.0), PlaybackMode::Scrubbed { lag: 1.0 }, false, 1e-4);
        gt.update(Some(0.0), 0.0);
        let first = y(&gt.update(Some(1.0), 0.1));
        approx(first, 135.0, 1e-3);
        assert!(gt.is_animating());
        for _ in 0..200 {
            gt.update(Some(1.0), 0.1);
        }
        assert!(!gt.is_animating());
        assert_eq!(gt.displayed_progress(), Some(1.0));
    }

    #[test]
    fn discrete_plays_on_enter_and_reverses_on_leave_back() {
        let actions: ToggleActions = "play none none reverse".parse().unwrap();
        let mut gt = GatedTimeline::new(
            slide(1.0),
            PlaybackMode::Discrete {
                actions,
                once: false,
            },
            false,
            1e-4,
        );
        let initial = gt.update(Some(-0.5), 0.0);
        approx(y(&initial), 150.0, 1e-4);
        assert!(!gt.is_playing());

        let entered = gt.update(Some(0.2), 0.5);
        assert_eq!(entered.crossings, vec![Crossing::Enter]);
        approx(y(&entered), 75.0, 1e-4);

        let done = gt.update(Some(0.3), 0.6);
        assert!(done.completed);
        approx(y(&done), 0.0, 1e-4);

        let back = gt.update(Some(-0.1), 0.25);
        assert_eq!(back.crossings, vec![Crossing::LeaveBack]);
        approx(y(&back), 37.5, 1e-4);
        gt.update(Some(-0.1), 2.0);
        assert!(!gt.is_playing());
    }

    #[test]
    fn once_ignores_later_crossings() {
        let actions: ToggleActions = "restart none none reset".parse().unwrap();
        let mut gt = GatedTimeline::new(
            slide(1.0),
            PlaybackMode::Discrete {
                actions,
                once: true,
            },
            false,
            1e-4,
        );
        gt.update(Some(0.5), 0.0);
        gt.update(Some(0.5), 2.0);
        let back = gt.update(Some(-1.0), 0.1);
        assert!(back.samples.is_none());
        assert!(!gt.is_playing());
    }

    #[test]
    fn pin_follows_region() {
        let mut gt = GatedTimeline::new(slide(1.0), PlaybackMode::Scrubbed { lag: 0.0 }, true, 1e-4);
        assert_eq!(gt.update(Some(-0.2), 0.0).pin_changed, None);
        assert_eq!(gt.update(Some(0.2), 0.0).pin_changed, Some(true));
        assert_eq!(gt.update(Some(0.8), 0.0).pin_changed, None);
        assert_eq!(gt.update(Some(1.4), 0.0).pin_changed, Some(false));
        assert!(!gt.is_pinned());
    }

    #[test]
    fn run_once_refuses_restart() {
        let mut gt =
            GatedTimeline::new(slide(1.0), PlaybackMode::Immediate, false, 1e-4).with_run_once();
        assert!(gt.apply(ToggleAction::Play));
        let done = gt.update(None, 1.5);
        assert!(done.completed);
        assert!(!gt.apply(ToggleAction::Restart));
        assert!(gt.update(None, 0.5).samples.is_none());
    }

    #[test]
    fn complete_jumps_to_end() {
        let mut gt = GatedTimeline::new(slide(1.0), PlaybackMode::Immediate, false, 1e-4);
        gt.update(None, 0.0);
        assert!(gt.apply(ToggleAction::Complete));
        let out = gt.update(None, 0.016);
        assert!(out.completed);
        approx(y(&out), 0.0, 1e-4);
    }
}
