mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{approx, init_logging, FakeEnv, RecordingBackend};
use folio_motion_core::{
    presets, Capability, Config, DeferredGate, Degradation, ElementId, HandleStatus, LoadSignal,
    LoadState, MotionEvent, ReducedMotionPolicy, Scheduler, SignalSource, ToggleAction,
};

fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

#[test]
fn fallback_timer_signals_at_configured_bound() {
    init_logging();
    let mut env = FakeEnv::new();
    let signal = LoadSignal::new();
    let mut gate = DeferredGate::new(Rc::clone(&signal), &Config::default());
    let (mounted, mount) = counter();
    gate.subscribe(mount);

    assert_eq!(gate.arm(&mut env), None);
    let (timer, ms) = env.only_timer().expect("fallback timer");
    assert_eq!(ms, 300);
    assert_eq!(env.observers.len(), 1);
    assert_eq!(mounted.get(), 0);
    assert_eq!(signal.state(), LoadState::Pending);

    env.fire_timer(timer);
    assert!(gate.on_timeout(&mut env, timer));
    assert_eq!(mounted.get(), 1);
    assert_eq!(
        signal.state(),
        LoadState::Signaled(SignalSource::FallbackTimer)
    );
    assert!(env.observers.is_empty());

    // a late paint notification changes nothing
    assert_eq!(gate.on_largest_paint(&mut env), None);
    assert!(!gate.on_timeout(&mut env, timer));
    assert_eq!(mounted.get(), 1);
}

#[test]
fn paint_wins_the_race_and_clears_the_timer() {
    let mut env = FakeEnv::new();
    let signal = LoadSignal::new();
    let mut gate = DeferredGate::new(Rc::clone(&signal), &Config::default());
    let (mounted, mount) = counter();
    gate.subscribe(mount);
    gate.arm(&mut env);
    let (timer, _) = env.only_timer().unwrap();

    assert_eq!(
        gate.on_largest_paint(&mut env),
        Some(SignalSource::LargestPaint)
    );
    assert_eq!(mounted.get(), 1);
    assert!(env.timers.is_empty());
    assert_eq!(env.timers_cleared, 1);
    assert_eq!(env.observers_disconnected, 1);
    assert!(!gate.on_timeout(&mut env, timer));
}

#[test]
fn late_subscribers_replay_once() {
    let mut env = FakeEnv::new();
    let mut gate = DeferredGate::new(LoadSignal::new(), &Config::default());
    gate.arm(&mut env);
    gate.on_largest_paint(&mut env);

    let (late, mount) = counter();
    gate.subscribe(mount);
    assert_eq!(late.get(), 1);
    assert_eq!(gate.subscriber_count(), 0);
}

#[test]
fn no_timers_means_signal_now() {
    let mut env = FakeEnv::new()
        .without(Capability::Timers)
        .without(Capability::LargestPaint);
    let signal = LoadSignal::new();
    let mut gate = DeferredGate::new(Rc::clone(&signal), &Config::default());
    let (mounted, mount) = counter();
    gate.subscribe(mount);
    assert_eq!(gate.arm(&mut env), Some(SignalSource::Unsupported));
    assert!(signal.is_signaled());
    assert_eq!(mounted.get(), 1);
}

#[test]
fn paint_observer_missing_still_falls_back() {
    let mut env = FakeEnv::new().without(Capability::LargestPaint);
    let mut gate = DeferredGate::new(LoadSignal::new(), &Config::default());
    gate.arm(&mut env);
    assert!(env.observers.is_empty());
    let (timer, _) = env.only_timer().unwrap();
    env.fire_timer(timer);
    assert!(gate.on_timeout(&mut env, timer));
    assert!(gate.is_signaled());
}

#[test]
fn teardown_before_signal_releases_and_drops_subscribers() {
    let mut env = FakeEnv::new();
    let signal = LoadSignal::new();
    let mut gate = DeferredGate::new(Rc::clone(&signal), &Config::default());
    let (mounted, mount) = counter();
    gate.subscribe(mount);
    gate.arm(&mut env);
    gate.teardown(&mut env);

    assert!(env.timers.is_empty());
    assert!(env.observers.is_empty());
    assert_eq!(gate.subscriber_count(), 0);
    assert_eq!(signal.state(), LoadState::Pending);
    assert_eq!(mounted.get(), 0);
}

#[test]
fn gate_mounts_background_layers_into_scheduler() {
    init_logging();
    let mut scheduler = Scheduler::new(
        Config::default(),
        FakeEnv::new().with_element(1, 0.0, 10.0),
        RecordingBackend::default(),
    );
    let mut gate = DeferredGate::new(LoadSignal::new(), scheduler.config());
    let queued = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&queued);
    gate.subscribe(move || {
        sink.borrow_mut()
            .push(presets::rotating_loop(ElementId(1), 360.0, 20.0));
    });

    gate.arm(scheduler.env_mut());
    assert!(queued.borrow().is_empty());
    if let Some(source) = gate.on_largest_paint(scheduler.env_mut()) {
        scheduler.notify(MotionEvent::GateSignaled { source });
    }
    for trigger in queued.borrow_mut().drain(..) {
        scheduler.register(trigger).unwrap();
    }
    assert_eq!(scheduler.active_count(), 1);
    let out = scheduler.frame(0.0);
    assert!(out.events.contains(&MotionEvent::GateSignaled {
        source: SignalSource::LargestPaint
    }));
}

fn reduced_scheduler(policy: ReducedMotionPolicy) -> Scheduler<FakeEnv, RecordingBackend> {
    init_logging();
    let cfg = Config {
        reduced_motion: policy,
        ..Config::default()
    };
    let env = FakeEnv::new()
        .with_element(1, 0.0, 10.0)
        .with_element(2, 0.0, 10.0)
        .with_reduced_motion();
    Scheduler::new(cfg, env, RecordingBackend::default())
}

#[test]
fn static_policy_never_starts_infinite_timelines() {
    let mut s = reduced_scheduler(ReducedMotionPolicy::Static);
    let looped = s
        .register(presets::rotating_loop(ElementId(1), 360.0, 1.0))
        .unwrap();
    let finite = s
        .register(presets::details_fade_in(ElementId(2), &[ElementId(2)]))
        .unwrap();
    assert_eq!(
        s.status(looped),
        Some(HandleStatus::Inert {
            reason: Degradation::ReducedMotion
        })
    );
    assert_eq!(s.status(finite), Some(HandleStatus::Active));
    assert_eq!(s.backend().created.len(), 1);
    assert!(!s.control(looped, ToggleAction::Play));
    s.frame(0.0);
    assert_eq!(s.backend().last(1, "rotation"), None);
}

#[test]
fn single_pass_policy_runs_loops_once() {
    let mut s = reduced_scheduler(ReducedMotionPolicy::SinglePass);
    let h = s
        .register(presets::rotating_loop(ElementId(1), 360.0, 1.0))
        .unwrap();
    assert_eq!(s.status(h), Some(HandleStatus::Active));

    let mut now = 0.0;
    let mut completions = 0;
    for _ in 0..40 {
        let out = s.frame(now);
        completions += out
            .events
            .iter()
            .filter(|e| **e == MotionEvent::Completed { handle: h })
            .count();
        now += 100.0;
    }
    assert_eq!(completions, 1);
    approx(s.backend().last(1, "rotation").unwrap(), 360.0, 1e-3);
    assert!(!s.pending_frame());

    // a second run is refused
    assert!(!s.control(h, ToggleAction::Restart));
    assert!(!s.control(h, ToggleAction::Play));
}

#[test]
fn reduced_motion_leaves_finite_timelines_alone() {
    let mut s = reduced_scheduler(ReducedMotionPolicy::SinglePass);
    let h = s
        .register(presets::rotating_loop(ElementId(1), 90.0, 1.0).with_key("spin"))
        .unwrap();
    let finite = s
        .register(presets::details_fade_in(ElementId(2), &[ElementId(2)]))
        .unwrap();
    assert_eq!(s.status(h), Some(HandleStatus::Active));
    assert_eq!(s.status(finite), Some(HandleStatus::Active));
    // the fade keeps its delay timer and is not limited to one run
    assert!(s.env().only_timer().is_some());
}
