//! Loading splash: simulated progress counter, exit choreography and the
//! decorative hexagon grid.
//!
//! [`Preloader`] is a pure state machine advanced by host time. Once
//! [`Preloader::advance`] reports the exit as due, the host registers
//! [`exit_trigger`] with the scheduler.

use serde::{Deserialize, Serialize};

use crate::easing::{EaseKind, Easing};
use crate::ids::ElementId;
use crate::rng::SeededRng;
use crate::timeline::{Repeat, StepPosition, TimelineSpec, TimelineStep};
use crate::trigger::AnimationTrigger;
use crate::value::Property;

pub const TICK_MS: u32 = 80;
/// Loading is forced to complete after this long.
pub const MAX_LOADING_MS: u32 = 2500;
pub const EXIT_DELAY_MS: u32 = 400;
pub const FORCED_EXIT_DELAY_MS: u32 = 300;
pub const HEX_COLUMNS: usize = 5;
pub const HEX_CELLS: usize = 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingLabel {
    Initializing,
    LoadingAssets,
    Finalizing,
    AlmostReady,
    Welcome,
}

impl LoadingLabel {
    pub fn for_progress(progress: u32) -> Self {
        match progress {
            p if p >= 100 => LoadingLabel::Welcome,
            p if p < 30 => LoadingLabel::Initializing,
            p if p < 60 => LoadingLabel::LoadingAssets,
            p if p < 90 => LoadingLabel::Finalizing,
            _ => LoadingLabel::AlmostReady,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadingLabel::Initializing => "INITIALIZING",
            LoadingLabel::LoadingAssets => "LOADING ASSETS",
            LoadingLabel::Finalizing => "FINALIZING",
            LoadingLabel::AlmostReady => "ALMOST READY",
            LoadingLabel::Welcome => "WELCOME",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreloaderPhase {
    Loading,
    /// Progress hit 100; `forced` when the time cap did it.
    Completed { forced: bool },
    Exiting,
}

#[derive(Clone, Debug)]
pub struct Preloader {
    rng: SeededRng,
    tick_ms: u32,
    progress: u32,
    label: LoadingLabel,
    elapsed_ms: u32,
    next_tick_ms: u32,
    phase: PreloaderPhase,
    exit_at_ms: Option<u32>,
}

impl Preloader {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed),
            tick_ms: TICK_MS,
            progress: 0,
            label: LoadingLabel::Initializing,
            elapsed_ms: 0,
            next_tick_ms: TICK_MS,
            phase: PreloaderPhase::Loading,
            exit_at_ms: None,
        }
    }

    /// Hosts that throttle intervals (background tabs) tick slower.
    pub fn with_tick_ms(mut self, tick_ms: u32) -> Self {
        self.tick_ms = tick_ms.max(1);
        self.next_tick_ms = self.tick_ms;
        self
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn label(&self) -> LoadingLabel {
        self.label
    }

    pub fn phase(&self) -> PreloaderPhase {
        self.phase
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// When the exit timeline is due, once loading completed.
    pub fn exit_at_ms(&self) -> Option<u32> {
        self.exit_at_ms
    }

    /// Advance host time. Returns true exactly once: when the exit timeline should start.
    pub fn advance(&mut self, dt_ms: u32) -> bool {
        let end = self.elapsed_ms.saturating_add(dt_ms);
        while self.phase == PreloaderPhase::Loading {
            let next = self.next_tick_ms;
            if next >= MAX_LOADING_MS {
                if end >= MAX_LOADING_MS {
                    self.complete(MAX_LOADING_MS, true);
                }
                break;
            }
            if next > end {
                break;
            }
            self.tick(next);
            self.next_tick_ms += self.tick_ms;
        }
        self.elapsed_ms = end;

        match (self.phase, self.exit_at_ms) {
            (PreloaderPhase::Completed { .. }, Some(at)) if end >= at => {
                self.phase = PreloaderPhase::Exiting;
                true
            }
            _ => false,
        }
    }

    fn tick(&mut self, at_ms: u32) {
        let next = self.progress + self.rng.range_inclusive(5, 19);
        if next >= 100 {
            self.complete(at_ms, false);
        } else {
            self.progress = next;
            self.label = LoadingLabel::for_progress(next);
        }
    }

    fn complete(&mut self, at_ms: u32, forced: bool) {
        self.progress = 100;
        self.label = LoadingLabel::Welcome;
        self.phase = PreloaderPhase::Completed { forced };
        let delay = if forced {
            FORCED_EXIT_DELAY_MS
        } else {
            EXIT_DELAY_MS
        };
        self.exit_at_ms = Some(at_ms + delay);
    }
}

/// Elements of the splash.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreloaderParts {
    pub root: ElementId,
    #[serde(default)]
    pub letters: Vec<ElementId>,
    #[serde(default)]
    pub layers: Vec<ElementId>,
    #[serde(default)]
    pub hexagons: Vec<ElementId>,
    #[serde(default)]
    pub circles: Vec<ElementId>,
    #[serde(default)]
    pub highlight: Option<ElementId>,
    #[serde(default)]
    pub code_lines: Vec<ElementId>,
}

/// Letters rise into place, layers lift away, then the whole splash fades out.
pub fn exit_trigger(parts: &PreloaderParts) -> AnimationTrigger {
    let back_out = Easing::Back {
        kind: EaseKind::Out,
        overshoot: 1.7,
    };
    let power3_out = Easing::Power {
        degree: 3,
        kind: EaseKind::Out,
    };
    let mut steps = Vec::new();
    if !parts.letters.is_empty() {
        steps.push(
            TimelineStep::new(Property::Y, 100.0, 0.0)
                .targets(parts.letters.iter().copied())
                .duration(0.8)
                .ease(back_out)
                .stagger(0.05),
        );
    }
    if !parts.layers.is_empty() {
        steps.push(
            TimelineStep::new(Property::Y, 0.0, -100.0)
                .targets(parts.layers.iter().copied())
                .duration(0.8)
                .ease(power3_out)
                .stagger(0.05)
                .at(StepPosition::Relative(-0.4)),
        );
    }
    steps.push(
        TimelineStep::new(Property::Opacity, 1.0, 0.0)
            .targets([parts.root])
            .duration(0.8)
            .ease(power3_out)
            .at(StepPosition::Relative(0.2)),
    );
    AnimationTrigger::immediate(parts.root, TimelineSpec::new(steps))
        .with_key(format!("preloader-exit:{}", parts.root))
}

/// Background motion while loading. Every loop is infinite except the code lines.
pub fn ambient_triggers(parts: &PreloaderParts) -> Vec<AnimationTrigger> {
    let spin = |targets: &[ElementId], degrees: f32, seconds: f32| {
        TimelineSpec::new(vec![TimelineStep::new(Property::Rotation, 0.0, degrees)
            .targets(targets.iter().copied())
            .duration(seconds)])
        .repeat(Repeat::Infinite)
    };
    let mut out = Vec::new();
    if !parts.hexagons.is_empty() {
        out.push(
            AnimationTrigger::immediate(parts.root, spin(&parts.hexagons, 360.0, 20.0))
                .with_key(format!("preloader-hexagons:{}", parts.root)),
        );
    }
    if !parts.circles.is_empty() {
        out.push(
            AnimationTrigger::immediate(parts.root, spin(&parts.circles, -360.0, 15.0))
                .with_key(format!("preloader-circles:{}", parts.root)),
        );
    }
    if !parts.code_lines.is_empty() {
        let lines = TimelineSpec::new(vec![TimelineStep::new(Property::WidthPercent, 0.0, 100.0)
            .targets(parts.code_lines.iter().copied())
            .duration(2.0)
            .ease(Easing::Power {
                degree: 2,
                kind: EaseKind::InOut,
            })
            .stagger(0.2)]);
        out.push(
            AnimationTrigger::immediate(parts.root, lines)
                .with_key(format!("preloader-code:{}", parts.root)),
        );
    }
    if let Some(highlight) = parts.highlight {
        let pulse = TimelineSpec::new(vec![TimelineStep::new(Property::Opacity, 1.0, 0.8)
            .duration(1.5)
            .ease(Easing::Sine(EaseKind::InOut))])
        .repeat(Repeat::Infinite)
        .yoyo(true);
        out.push(AnimationTrigger::immediate(highlight, pulse));
    }
    out
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    Primary,
    Secondary,
}

/// Hexagon placement in percent of the splash. Fixed so the grid never shifts layout.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HexCell {
    pub top_percent: f32,
    pub left_percent: f32,
    pub accent: Accent,
}

pub fn hex_grid() -> Vec<HexCell> {
    (0..HEX_CELLS)
        .map(|i| {
            let row = (i / HEX_COLUMNS) as f32;
            let col = (i % HEX_COLUMNS) as f32;
            HexCell {
                top_percent: 10.0 + row * 25.0,
                left_percent: 5.0 + col * 22.0,
                accent: if i % 2 == 0 {
                    Accent::Primary
                } else {
                    Accent::Secondary
                },
            }
        })
        .collect()
}
