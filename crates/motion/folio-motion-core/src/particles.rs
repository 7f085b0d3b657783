//! Background particle field.
//!
//! Layout is generated from a seed and the viewport, so a given seed always
//! yields the same field. Each particle gets two endless timelines: a rise
//! that fades out and a sideways drift.

use serde::{Deserialize, Serialize};

use crate::easing::{EaseKind, Easing};
use crate::geometry::Viewport;
use crate::ids::ElementId;
use crate::rng::SeededRng;
use crate::timeline::{Repeat, StepPosition, TimelineSpec, TimelineStep};
use crate::trigger::AnimationTrigger;
use crate::value::{Property, PropertyValue};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Colour token for particle fill.
    pub fn particle_token(self) -> &'static str {
        match self {
            Theme::Dark => "primary/40",
            Theme::Light => "secondary/40",
        }
    }
}

/// Particle count for a viewport width.
pub fn particle_count(viewport_width: f32) -> usize {
    if viewport_width < 768.0 {
        100
    } else if viewport_width < 1280.0 {
        150
    } else {
        200
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub size: f32,
    pub opacity: f32,
    pub left: f32,
    pub top: f32,
    /// Upward travel per rise cycle (px).
    pub rise: f32,
    pub rise_duration: f32,
    pub rise_delay: f32,
    /// Horizontal drift target (px, signed).
    pub drift: f32,
    pub drift_duration: f32,
}

impl Particle {
    /// Styles applied once before the loops start.
    pub fn initial_properties(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::new(Property::from("width"), self.size),
            PropertyValue::new(Property::from("height"), self.size),
            PropertyValue::new(Property::Opacity, self.opacity),
            PropertyValue::new(Property::from("left"), self.left),
            PropertyValue::new(Property::from("top"), self.top),
        ]
    }

    fn rise_trigger(&self, element: ElementId) -> AnimationTrigger {
        let timeline = TimelineSpec::new(vec![
            TimelineStep::new(Property::Y, 0.0, -self.rise)
                .duration(self.rise_duration)
                .ease(Easing::Linear),
            TimelineStep::new(Property::Opacity, self.opacity, 0.0)
                .duration(self.rise_duration)
                .ease(Easing::Linear)
                .at(StepPosition::WithPrevious),
        ])
        .delay(self.rise_delay)
        .repeat(Repeat::Infinite);
        AnimationTrigger::immediate(element, timeline).with_key(format!("particle-rise:{element}"))
    }

    fn drift_trigger(&self, element: ElementId) -> AnimationTrigger {
        let timeline = TimelineSpec::new(vec![TimelineStep::new(Property::X, 0.0, self.drift)
            .duration(self.drift_duration)
            .ease(Easing::Sine(EaseKind::InOut))])
        .repeat(Repeat::Infinite)
        .yoyo(true);
        AnimationTrigger::immediate(element, timeline)
            .with_key(format!("particle-drift:{element}"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleField {
    pub theme: Theme,
    pub particles: Vec<Particle>,
}

impl ParticleField {
    pub fn generate(viewport: &Viewport, theme: Theme, seed: u32) -> Self {
        let mut rng = SeededRng::new(seed);
        let count = particle_count(viewport.width);
        let particles = (0..count)
            .map(|_| Particle {
                size: rng.range(2.0, 6.0),
                opacity: rng.range(0.2, 0.8),
                left: rng.range(0.0, viewport.width),
                top: rng.range(0.0, viewport.height * 2.0),
                rise: viewport.height + 100.0,
                rise_duration: rng.range(15.0, 35.0),
                rise_delay: rng.range(0.0, 5.0),
                drift: rng.range(-50.0, 50.0),
                drift_duration: rng.range(10.0, 25.0),
            })
            .collect();
        Self { theme, particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn token(&self) -> &'static str {
        self.theme.particle_token()
    }

    /// Rise and drift triggers, pairing particles with `elements` in order.
    /// Extra particles or elements are ignored.
    pub fn triggers(&self, elements: &[ElementId]) -> Vec<AnimationTrigger> {
        self.particles
            .iter()
            .zip(elements)
            .flat_map(|(p, e)| [p.rise_trigger(*e), p.drift_trigger(*e)])
            .collect()
    }
}
