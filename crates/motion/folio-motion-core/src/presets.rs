//! Section choreography used across the site.
//!
//! Every band, duration and stagger the views use lives here so that view
//! variants cannot drift apart. Each function builds an [`AnimationTrigger`]
//! from explicit element handles; the caller registers it.

use crate::band::{Anchor, BandEdge};
use crate::easing::{EaseKind, Easing};
use crate::ids::ElementId;
use crate::playback::{ToggleAction, ToggleActions};
use crate::timeline::{Repeat, StepPosition, TimelineSpec, TimelineStep};
use crate::trigger::{AnimationTrigger, ScrollTriggerSpec};
use crate::value::Property;

const fn edge(element: Anchor, viewport: Anchor) -> BandEdge {
    BandEdge::new(element, viewport)
}

const POWER2_OUT: Easing = Easing::Power {
    degree: 2,
    kind: EaseKind::Out,
};
const POWER3_OUT: Easing = Easing::Power {
    degree: 3,
    kind: EaseKind::Out,
};
const BACK_OUT: Easing = Easing::Back {
    kind: EaseKind::Out,
    overshoot: 1.7,
};
const SINE_IN_OUT: Easing = Easing::Sine(EaseKind::InOut);

/// Default discrete end edge: element bottom leaves the viewport top.
const LEAVES_TOP: BandEdge = edge(Anchor::Bottom, Anchor::Top);

const RESTART_REVERSE: ToggleActions = ToggleActions {
    on_enter: ToggleAction::Restart,
    on_leave: ToggleAction::None,
    on_enter_back: ToggleAction::None,
    on_leave_back: ToggleAction::Reverse,
};

/// A section sliding and fading away as its bottom edge scrolls past.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SectionExit {
    pub start: BandEdge,
    pub end: BandEdge,
    pub scrub: f32,
    pub y: f32,
    pub opacity: f32,
}

pub const SKILLS_EXIT: SectionExit = SectionExit {
    start: edge(Anchor::Bottom, Anchor::Percent(30.0)),
    end: edge(Anchor::Bottom, Anchor::Percent(10.0)),
    scrub: 1.0,
    y: -100.0,
    opacity: 0.5,
};

pub const EXPERIENCES_EXIT: SectionExit = SectionExit {
    start: edge(Anchor::Bottom, Anchor::Percent(50.0)),
    end: edge(Anchor::Bottom, Anchor::Percent(20.0)),
    scrub: 1.0,
    y: -150.0,
    opacity: 0.0,
};

/// About-me paragraphs rising into place while the section scrolls in.
pub fn slide_up_reveal(section: ElementId, items: &[ElementId]) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(
        edge(Anchor::Top, Anchor::Percent(70.0)),
        edge(Anchor::Bottom, Anchor::Bottom),
    )
    .scrub(0.5);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 150.0, 0.0)
            .targets(items.iter().copied())
            .stagger(0.05),
        TimelineStep::new(Property::Opacity, 0.0, 1.0)
            .targets(items.iter().copied())
            .stagger(0.05)
            .at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(section, scroll, timeline)
}

/// About-me paragraphs leaving upwards once the section bottom passes mid-viewport.
pub fn slide_up_exit(section: ElementId, items: &[ElementId]) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(
        edge(Anchor::Bottom, Anchor::Percent(50.0)),
        edge(Anchor::Bottom, Anchor::Percent(10.0)),
    )
    .scrub(0.5);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 0.0, -150.0)
            .targets(items.iter().copied())
            .stagger(0.02),
        TimelineStep::new(Property::Opacity, 1.0, 0.0)
            .targets(items.iter().copied())
            .stagger(0.02)
            .at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(section, scroll, timeline)
}

/// Items popping in once when `trigger` reaches 85% of the viewport (skills grid).
pub fn staggered_entry(trigger: ElementId, items: &[ElementId], stagger: f32) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(edge(Anchor::Top, Anchor::Percent(85.0)), LEAVES_TOP);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 20.0, 0.0)
            .targets(items.iter().copied())
            .duration(0.6)
            .ease(POWER2_OUT)
            .stagger(stagger),
        TimelineStep::new(Property::Opacity, 0.0, 1.0)
            .targets(items.iter().copied())
            .duration(0.6)
            .ease(POWER2_OUT)
            .stagger(stagger)
            .at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(trigger, scroll, timeline)
}

/// Skills heading and category titles.
pub fn skills_headings(
    section: ElementId,
    title: ElementId,
    categories: &[ElementId],
) -> [AnimationTrigger; 2] {
    let title_in = AnimationTrigger::scroll(
        section,
        ScrollTriggerSpec::new(edge(Anchor::Top, Anchor::Percent(85.0)), LEAVES_TOP),
        TimelineSpec::new(vec![
            TimelineStep::new(Property::Y, 30.0, 0.0)
                .targets([title])
                .duration(0.8)
                .ease(POWER2_OUT),
            TimelineStep::new(Property::Opacity, 0.0, 1.0)
                .targets([title])
                .duration(0.8)
                .ease(POWER2_OUT)
                .at(StepPosition::WithPrevious),
        ]),
    )
    .with_key(format!("skills-title:{title}"));
    let categories_in = AnimationTrigger::scroll(
        section,
        ScrollTriggerSpec::new(edge(Anchor::Top, Anchor::Percent(80.0)), LEAVES_TOP),
        TimelineSpec::new(vec![
            TimelineStep::new(Property::X, -50.0, 0.0)
                .targets(categories.iter().copied())
                .duration(0.8)
                .ease(POWER2_OUT)
                .stagger(0.2),
            TimelineStep::new(Property::Opacity, 0.0, 1.0)
                .targets(categories.iter().copied())
                .duration(0.8)
                .ease(POWER2_OUT)
                .stagger(0.2)
                .at(StepPosition::WithPrevious),
        ]),
    );
    [title_in, categories_in]
}

/// Timeline entries rising in while the experiences section scrolls through.
pub fn experience_rise(section: ElementId, items: &[ElementId]) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(
        edge(Anchor::Top, Anchor::Percent(60.0)),
        edge(Anchor::Bottom, Anchor::Percent(50.0)),
    )
    .scrub(1.0)
    .toggle_actions(RESTART_REVERSE);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 50.0, 0.0)
            .targets(items.iter().copied())
            .stagger(0.3),
        TimelineStep::new(Property::Opacity, 0.0, 1.0)
            .targets(items.iter().copied())
            .stagger(0.3)
            .at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(section, scroll, timeline)
}

pub fn section_fade_out(section: ElementId, exit: &SectionExit) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(exit.start, exit.end).scrub(exit.scrub);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 0.0, exit.y),
        TimelineStep::new(Property::Opacity, 1.0, exit.opacity).at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(section, scroll, timeline)
}

/// Project list container rising as its top enters the viewport.
pub fn list_rise(container: ElementId) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(
        edge(Anchor::Top, Anchor::Bottom),
        edge(Anchor::Top, Anchor::Percent(80.0)),
    )
    .scrub(1.0)
    .toggle_actions(RESTART_REVERSE);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 150.0, 0.0),
        TimelineStep::new(Property::Opacity, 0.0, 1.0).at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(container, scroll, timeline)
}

/// Project info panel pinned and blurred away as the page scrolls past it.
pub fn pinned_blur(info: ElementId) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(
        edge(Anchor::Bottom, Anchor::Bottom),
        edge(Anchor::Bottom, Anchor::Top),
    )
    .scrub(1.5)
    .pin();
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Blur, 0.0, 3.0),
        TimelineStep::new(Property::Opacity, 1.0, 0.0).at(StepPosition::WithPrevious),
        TimelineStep::new(Property::Scale, 1.0, 0.9).at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(info, scroll, timeline)
}

/// Project detail blocks fading in after the page settles.
pub fn details_fade_in(page: ElementId, items: &[ElementId]) -> AnimationTrigger {
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Opacity, 0.0, 1.0)
            .targets(items.iter().copied())
            .duration(1.0)
            .ease(POWER2_OUT)
            .stagger(0.15),
        TimelineStep::new(Property::Y, 30.0, 0.0)
            .targets(items.iter().copied())
            .duration(1.0)
            .ease(POWER2_OUT)
            .stagger(0.15)
            .at(StepPosition::WithPrevious),
    ])
    .delay(0.8);
    AnimationTrigger::immediate(page, timeline).with_key(format!("details-fade-in:{page}"))
}

/// Banner pieces animated by the intro timeline. Pieces that carry the
/// largest paint must not be listed here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BannerParts {
    pub grid_lines: Vec<ElementId>,
    pub title_words: Vec<ElementId>,
    pub badge: Option<ElementId>,
    pub description: Option<ElementId>,
    pub stat_cards: Vec<ElementId>,
    pub cta: Option<ElementId>,
}

fn from_to(
    steps: &mut Vec<TimelineStep>,
    targets: &[ElementId],
    at: f32,
    props: &[(Property, f32, f32)],
    duration: f32,
    easing: Easing,
    stagger: f32,
) {
    if targets.is_empty() {
        return;
    }
    for (property, from, to) in props {
        steps.push(
            TimelineStep::new(property.clone(), *from, *to)
                .targets(targets.iter().copied())
                .duration(duration)
                .ease(easing)
                .stagger(stagger)
                .at(StepPosition::Absolute(at)),
        );
    }
}

/// Banner load sequence; meant to be registered once the deferred gate opens.
pub fn banner_intro(banner: ElementId, parts: &BannerParts) -> AnimationTrigger {
    let mut steps = Vec::new();
    let one = |e: Option<ElementId>| e.into_iter().collect::<Vec<_>>();
    from_to(
        &mut steps,
        &parts.grid_lines,
        0.0,
        &[(Property::ScaleX, 0.0, 1.0), (Property::Opacity, 0.0, 0.5)],
        1.0,
        POWER3_OUT,
        0.05,
    );
    from_to(
        &mut steps,
        &parts.title_words,
        0.1,
        &[(Property::Y, 80.0, 0.0), (Property::Opacity, 0.0, 1.0)],
        0.7,
        BACK_OUT,
        0.1,
    );
    from_to(
        &mut steps,
        &one(parts.badge),
        0.5,
        &[(Property::Scale, 0.0, 1.0), (Property::Opacity, 0.0, 1.0)],
        0.5,
        BACK_OUT,
        0.0,
    );
    from_to(
        &mut steps,
        &one(parts.description),
        0.7,
        &[(Property::Y, 30.0, 0.0), (Property::Opacity, 0.0, 1.0)],
        0.7,
        Easing::Linear,
        0.0,
    );
    from_to(
        &mut steps,
        &parts.stat_cards,
        0.6,
        &[(Property::X, 100.0, 0.0), (Property::Opacity, 0.0, 1.0)],
        0.7,
        POWER3_OUT,
        0.15,
    );
    from_to(
        &mut steps,
        &one(parts.cta),
        0.9,
        &[(Property::Y, 20.0, 0.0), (Property::Opacity, 0.0, 1.0)],
        0.5,
        Easing::Linear,
        0.0,
    );
    AnimationTrigger::immediate(banner, TimelineSpec::new(steps))
        .with_key(format!("banner-intro:{banner}"))
}

/// Banner content drifting up while the banner scrolls out.
pub fn banner_parallax(banner: ElementId, items: &[ElementId]) -> AnimationTrigger {
    let scroll = ScrollTriggerSpec::new(
        edge(Anchor::Top, Anchor::Top),
        edge(Anchor::Bottom, Anchor::Percent(10.0)),
    )
    .scrub(1.0);
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 0.0, -100.0)
            .targets(items.iter().copied())
            .stagger(0.1),
        TimelineStep::new(Property::Opacity, 1.0, 0.5)
            .targets(items.iter().copied())
            .stagger(0.1)
            .at(StepPosition::WithPrevious),
    ]);
    AnimationTrigger::scroll(banner, scroll, timeline)
}

/// Decorative shapes bobbing forever.
pub fn floating_loop(owner: ElementId, shapes: &[ElementId]) -> AnimationTrigger {
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Y, 0.0, -20.0)
            .targets(shapes.iter().copied())
            .duration(6.0)
            .ease(SINE_IN_OUT)
            .stagger(0.8),
        TimelineStep::new(Property::Rotation, 0.0, 8.0)
            .targets(shapes.iter().copied())
            .duration(6.0)
            .ease(SINE_IN_OUT)
            .stagger(0.8)
            .at(StepPosition::WithPrevious),
    ])
    .repeat(Repeat::Infinite)
    .yoyo(true);
    AnimationTrigger::immediate(owner, timeline).with_key(format!("floating:{owner}"))
}

/// Highlight pulse; the loop the banner drops first under reduced motion.
pub fn pulse_loop(owner: ElementId, items: &[ElementId]) -> AnimationTrigger {
    let timeline = TimelineSpec::new(vec![
        TimelineStep::new(Property::Scale, 1.0, 1.05)
            .targets(items.iter().copied())
            .duration(3.0)
            .ease(SINE_IN_OUT)
            .stagger(1.0),
        TimelineStep::new(Property::Opacity, 1.0, 0.8)
            .targets(items.iter().copied())
            .duration(3.0)
            .ease(SINE_IN_OUT)
            .stagger(1.0)
            .at(StepPosition::WithPrevious),
    ])
    .repeat(Repeat::Infinite)
    .yoyo(true);
    AnimationTrigger::immediate(owner, timeline).with_key(format!("pulse:{owner}"))
}

/// Endless linear spin by `degrees` every `seconds`.
pub fn rotating_loop(element: ElementId, degrees: f32, seconds: f32) -> AnimationTrigger {
    let timeline = TimelineSpec::new(vec![TimelineStep::new(Property::Rotation, 0.0, degrees)
        .duration(seconds)
        .ease(Easing::Linear)])
    .repeat(Repeat::Infinite);
    AnimationTrigger::immediate(element, timeline).with_key(format!("rotate:{element}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::timeline::Timeline;

    #[test]
    fn reveal_uses_about_band() {
        let t = slide_up_reveal(ElementId(1), &[ElementId(2)]);
        let scroll = t.scroll.as_ref().unwrap();
        assert_eq!(scroll.start.to_string(), "top 70%");
        assert_eq!(scroll.end.to_string(), "bottom bottom");
        assert_eq!(scroll.scrub, 0.5);
    }

    #[test]
    fn banner_offsets_are_absolute() {
        let parts = BannerParts {
            grid_lines: vec![ElementId(10), ElementId(11)],
            title_words: vec![ElementId(20)],
            badge: Some(ElementId(30)),
            description: Some(ElementId(40)),
            stat_cards: vec![ElementId(50)],
            cta: Some(ElementId(60)),
        };
        let t = banner_intro(ElementId(1), &parts);
        let tl = Timeline::compile(&t.timeline, t.element, &Config::default()).unwrap();
        let start_of = |e: u32| {
            tl.segments()
                .iter()
                .find(|s| s.target == ElementId(e))
                .map(|s| s.start)
                .unwrap()
        };
        assert_eq!(start_of(11), 0.05);
        assert_eq!(start_of(20), 0.1);
        assert_eq!(start_of(30), 0.5);
        assert_eq!(start_of(40), 0.7);
        assert_eq!(start_of(50), 0.6);
        assert_eq!(start_of(60), 0.9);
        assert!((tl.duration() - 1.4).abs() < 1e-6);
    }

    #[test]
    fn loops_are_infinite() {
        assert!(floating_loop(ElementId(1), &[ElementId(2)]).timeline.is_infinite());
        assert!(rotating_loop(ElementId(3), 360.0, 40.0).timeline.is_infinite());
    }
}
