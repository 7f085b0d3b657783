//! Animation scheduler: the registry of live timelines.
//!
//! Owns every registration and the host resources it holds (scroll
//! listener, delayed-start timer, the shared frame request). Each frame runs
//! the phases in a fixed order:
//!   read (geometry) -> compute (interpolation) -> write (commit)
//! so no layout read ever follows a style write within one frame.

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{Config, ReducedMotionPolicy};
use crate::environment::{AnimationBackend, Environment};
use crate::error::{Capability, Degradation, MotionError};
use crate::ids::{ElementId, FrameRequestId, HandleId, IdAllocator, ListenerId, TimerId};
use crate::outputs::{ChannelOwners, FrameOutputs, MotionEvent, PropertyWrite, WriteBatch};
use crate::playback::{GatedTimeline, PlaybackMode, ToggleAction};
use crate::timeline::Timeline;
use crate::tracker::ScrollTracker;
use crate::trigger::AnimationTrigger;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandleStatus {
    Active,
    /// Registered but never animates.
    Inert { reason: Degradation },
    Disposed,
}

/// Result of [`Scheduler::dispose`]. Disposing twice is not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeOutcome {
    Disposed,
    AlreadyDisposed,
}

#[derive(Debug)]
struct Entry {
    key: Option<String>,
    element: ElementId,
    status: HandleStatus,
    playback: Option<GatedTimeline>,
    listener: Option<ListenerId>,
    delay_timer: Option<TimerId>,
    scroll_driven: bool,
}

impl Entry {
    fn inert(element: ElementId, reason: Degradation) -> Self {
        Self {
            key: None,
            element,
            status: HandleStatus::Inert { reason },
            playback: None,
            listener: None,
            delay_timer: None,
            scroll_driven: false,
        }
    }
}

pub struct Scheduler<E: Environment, B: AnimationBackend> {
    cfg: Config,
    env: E,
    backend: B,
    ids: IdAllocator,
    entries: IndexMap<HandleId, Entry>,
    keys: HashMap<String, HandleId>,
    tracker: ScrollTracker,
    owners: ChannelOwners,
    frame_request: Option<FrameRequestId>,
    last_frame_ms: Option<f64>,
    epoch: u64,
    pending_events: Vec<MotionEvent>,
    outputs: FrameOutputs,
}

impl<E: Environment, B: AnimationBackend> Scheduler<E, B> {
    pub fn new(cfg: Config, env: E, backend: B) -> Self {
        Self {
            cfg,
            env,
            backend,
            ids: IdAllocator::new(),
            entries: IndexMap::new(),
            keys: HashMap::new(),
            tracker: ScrollTracker::new(),
            owners: ChannelOwners::new(),
            frame_request: None,
            last_frame_ms: None,
            epoch: 0,
            pending_events: Vec::new(),
            outputs: FrameOutputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn tracker(&self) -> &ScrollTracker {
        &self.tracker
    }

    /// Register a trigger. Invalid timelines are rejected; missing host
    /// capabilities or a missing element yield an inert handle instead.
    ///
    /// A trigger with the same logical key as a live registration replaces it:
    /// the previous handle is disposed before the new one acquires anything.
    pub fn register(&mut self, trigger: AnimationTrigger) -> Result<HandleId, MotionError> {
        let compiled = Timeline::compile(&trigger.timeline, trigger.element, &self.cfg)?;
        let key = trigger.logical_key();

        let previous = key.as_ref().and_then(|k| self.keys.get(k).copied());
        if let Some(prev) = previous {
            self.dispose(prev);
        }

        let handle = self.ids.alloc_handle();
        let element = trigger.element;
        if let Some(prev) = previous {
            debug!("{handle} replaces {prev} for key {key:?}");
            self.pending_events.push(MotionEvent::Replaced {
                previous: prev,
                handle,
            });
        }
        self.pending_events.push(MotionEvent::Registered {
            handle,
            element,
            key: key.clone(),
        });
        if let Some(k) = &key {
            self.keys.insert(k.clone(), handle);
        }

        let mut entry = match self.activate(handle, &trigger, compiled) {
            Ok(entry) => entry,
            Err(reason) => {
                debug!("{handle} on {element} is inert: {reason:?}");
                self.pending_events.push(MotionEvent::Degraded {
                    handle,
                    reason: reason.clone(),
                });
                Entry::inert(element, reason)
            }
        };
        entry.key = key;
        self.entries.insert(handle, entry);
        self.ensure_frame();
        Ok(handle)
    }

    fn activate(
        &mut self,
        handle: HandleId,
        trigger: &AnimationTrigger,
        compiled: Timeline,
    ) -> Result<Entry, Degradation> {
        let scroll = trigger.scroll.as_ref();
        let mut required = vec![Capability::AnimationFrame, Capability::Geometry];
        if scroll.is_some() {
            required.push(Capability::ScrollEvents);
        }
        if let Some(capability) = required.into_iter().find(|c| !self.env.is_available(*c)) {
            return Err(Degradation::EnvironmentUnavailable { capability });
        }
        if self.env.element_rect(trigger.element).is_none() {
            return Err(Degradation::TargetNotFound {
                element: trigger.element,
            });
        }

        let reduced = self.env.prefers_reduced_motion() && compiled.is_infinite();
        if reduced && self.cfg.reduced_motion == ReducedMotionPolicy::Static {
            return Err(Degradation::ReducedMotion);
        }
        let timeline = if reduced {
            compiled.single_pass()
        } else {
            compiled
        };

        let mode = trigger.playback_mode();
        let pin = scroll.is_some_and(|s| s.pin);
        let mut playback = GatedTimeline::new(timeline, mode, pin, self.cfg.scrub_snap_epsilon);
        if reduced {
            debug!("{handle}: reduced motion, single pass");
            playback = playback.with_run_once();
        }

        let mut listener = None;
        if let Some(scroll) = scroll {
            listener = Some(self.env.add_scroll_listener().ok_or(
                Degradation::EnvironmentUnavailable {
                    capability: Capability::ScrollEvents,
                },
            )?);
            self.tracker.track(handle, trigger.element, scroll.band());
        }

        let mut delay_timer = None;
        if mode == PlaybackMode::Immediate && !playback.timeline().starts_paused() {
            let delay = playback.timeline().delay();
            if delay > 0.0 && self.env.is_available(Capability::Timers) {
                delay_timer = self.env.set_timeout((delay * 1000.0).round() as u32);
            }
            if delay_timer.is_none() {
                playback.apply(ToggleAction::Play);
            }
        }

        self.backend
            .create_timeline(handle, trigger.element, playback.timeline());
        debug!(
            "registered {handle} on {} ({:?}, {} segments)",
            trigger.element,
            mode,
            playback.timeline().segments().len()
        );
        Ok(Entry {
            key: None,
            element: trigger.element,
            status: HandleStatus::Active,
            playback: Some(playback),
            listener,
            delay_timer,
            scroll_driven: scroll.is_some(),
        })
    }

    /// Release every resource held by `handle`. Idempotent.
    pub fn dispose(&mut self, handle: HandleId) -> DisposeOutcome {
        let Some(mut entry) = self.entries.shift_remove(&handle) else {
            return DisposeOutcome::AlreadyDisposed;
        };
        if let Some(listener) = entry.listener.take() {
            self.env.remove_scroll_listener(listener);
        }
        if let Some(timer) = entry.delay_timer.take() {
            self.env.clear_timeout(timer);
        }
        if entry.playback.take().is_some() {
            self.backend.kill_timeline(handle);
        }
        if entry.scroll_driven {
            self.tracker.untrack(handle);
        }
        self.owners.release(handle);
        if let Some(key) = &entry.key {
            if self.keys.get(key) == Some(&handle) {
                self.keys.remove(key);
            }
        }
        if self.active_count() == 0 {
            if let Some(request) = self.frame_request.take() {
                self.env.cancel_frame(request);
            }
        }
        debug!("disposed {handle} on {}", entry.element);
        self.pending_events.push(MotionEvent::Disposed { handle });
        DisposeOutcome::Disposed
    }

    /// Dispose every registration, in registration order.
    pub fn dispose_all(&mut self) -> usize {
        let handles: Vec<HandleId> = self.entries.keys().copied().collect();
        for handle in &handles {
            self.dispose(*handle);
        }
        handles.len()
    }

    /// `None` for handles this scheduler never issued.
    pub fn status(&self, handle: HandleId) -> Option<HandleStatus> {
        match self.entries.get(&handle) {
            Some(entry) => Some(entry.status.clone()),
            None if self.ids.is_issued(handle) => Some(HandleStatus::Disposed),
            None => None,
        }
    }

    /// Drive a clocked timeline by hand. Returns false when ignored.
    pub fn control(&mut self, handle: HandleId, action: ToggleAction) -> bool {
        let Some(playback) = self
            .entries
            .get_mut(&handle)
            .and_then(|e| e.playback.as_mut())
        else {
            return false;
        };
        let applied = playback.apply(action);
        if applied {
            self.ensure_frame();
        }
        applied
    }

    pub fn on_scroll(&mut self) {
        self.tracker.invalidate();
        self.ensure_frame();
    }

    pub fn on_resize(&mut self) {
        self.tracker.invalidate();
        self.ensure_frame();
    }

    /// Route a host timeout. Returns false when no registration owns `id`.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        let Some((handle, entry)) = self
            .entries
            .iter_mut()
            .find(|(_, e)| e.delay_timer == Some(id))
        else {
            return false;
        };
        entry.delay_timer = None;
        if let Some(playback) = entry.playback.as_mut() {
            let delay = playback.timeline().delay();
            playback.seek(delay);
            playback.apply(ToggleAction::Play);
            debug!("{handle}: delayed start after {delay}s");
        }
        self.ensure_frame();
        true
    }

    /// Queue an event produced outside the scheduler (e.g. by the gate) for the next frame.
    pub fn notify(&mut self, event: MotionEvent) {
        self.pending_events.push(event);
    }

    /// Run one frame at host time `now_ms`.
    pub fn frame(&mut self, now_ms: f64) -> &FrameOutputs {
        // the host consumed the request that led here
        self.frame_request = None;
        let dt = match self.last_frame_ms {
            Some(prev) => ((now_ms - prev).clamp(0.0, self.cfg.max_frame_dt_ms) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.epoch += 1;

        // read
        self.tracker.measure(&self.env);

        // compute
        let mut batch = WriteBatch::new();
        let mut events = std::mem::take(&mut self.pending_events);
        let mut animating = false;
        for (handle, entry) in self.entries.iter_mut() {
            let Some(playback) = entry.playback.as_mut() else {
                continue;
            };
            let raw = if entry.scroll_driven {
                match self.tracker.raw(*handle) {
                    Some(raw) => Some(raw),
                    // element left the render tree: hold still
                    None => continue,
                }
            } else {
                None
            };
            let update = playback.update(raw, dt);
            events.extend(
                update
                    .crossings
                    .iter()
                    .map(|c| MotionEvent::crossing(*handle, *c)),
            );
            if let Some(pinned) = update.pin_changed {
                events.push(MotionEvent::PinChanged {
                    handle: *handle,
                    element: entry.element,
                    pinned,
                });
            }
            if update.completed {
                events.push(MotionEvent::Completed { handle: *handle });
            }
            if let Some(samples) = update.samples {
                for s in samples {
                    batch.push(PropertyWrite {
                        handle: *handle,
                        element: s.element,
                        property: s.property,
                        value: s.value,
                    });
                }
            }
            animating |= playback.is_animating();
        }
        if events.len() > self.cfg.max_events_per_frame {
            let dropped = shed_crossings(&mut events, self.cfg.max_events_per_frame);
            warn!(
                "frame {} produced {} events; dropped {dropped} crossings",
                self.epoch,
                events.len() + dropped,
            );
        }

        // write
        batch.yield_to(&self.owners);
        for (element, values) in batch.by_element() {
            self.backend.set_properties(element, &values);
        }
        let (writes, conflicts) = batch.into_parts();
        self.owners.commit(&writes);
        trace!(
            "frame {} dt={dt:.4}s: {} writes, {} conflicts, {} events",
            self.epoch,
            writes.len(),
            conflicts.len(),
            events.len()
        );
        self.outputs = FrameOutputs {
            epoch: self.epoch,
            writes,
            conflicts,
            events,
        };

        if animating {
            self.ensure_frame();
        }
        &self.outputs
    }

    /// Last frame's outputs.
    pub fn outputs(&self) -> &FrameOutputs {
        &self.outputs
    }

    pub fn active_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status == HandleStatus::Active)
            .count()
    }

    /// All live handles in registration order, inert ones included.
    pub fn handles(&self) -> Vec<HandleId> {
        self.entries.keys().copied().collect()
    }

    pub fn pending_frame(&self) -> bool {
        self.frame_request.is_some()
    }

    fn ensure_frame(&mut self) {
        if self.frame_request.is_some() || self.active_count() == 0 {
            return;
        }
        self.frame_request = self.env.request_frame();
    }
}

/// Drop the newest band crossings until `events` fits in `max`. Lifecycle
/// events are kept even when that leaves the frame over budget.
fn shed_crossings(events: &mut Vec<MotionEvent>, max: usize) -> usize {
    let mut excess = events.len().saturating_sub(max);
    let mut dropped = 0;
    let mut kept = Vec::with_capacity(events.len());
    for event in events.drain(..).rev() {
        if excess > 0 && event.is_crossing() {
            excess -= 1;
            dropped += 1;
        } else {
            kept.push(event);
        }
    }
    kept.reverse();
    *events = kept;
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Headless, NullBackend};
    use crate::timeline::{TimelineSpec, TimelineStep};

    fn fade(element: u32) -> AnimationTrigger {
        AnimationTrigger::immediate(
            ElementId(element),
            TimelineSpec::new(vec![TimelineStep::new("opacity", 0.0, 1.0)]),
        )
    }

    #[test]
    fn headless_registrations_are_inert() {
        let mut s = Scheduler::new(Config::default(), Headless, NullBackend);
        let h = s.register(fade(1)).unwrap();
        assert_eq!(
            s.status(h),
            Some(HandleStatus::Inert {
                reason: Degradation::EnvironmentUnavailable {
                    capability: Capability::AnimationFrame
                }
            })
        );
        assert_eq!(s.active_count(), 0);
        assert!(!s.pending_frame());
        assert!(!s.control(h, ToggleAction::Play));
        assert_eq!(s.dispose(h), DisposeOutcome::Disposed);
        assert_eq!(s.dispose(h), DisposeOutcome::AlreadyDisposed);
        assert_eq!(s.status(h), Some(HandleStatus::Disposed));
        assert_eq!(s.status(HandleId(99)), None);
    }

    #[test]
    fn invalid_timeline_is_rejected() {
        let mut s = Scheduler::new(Config::default(), Headless, NullBackend);
        let bad = AnimationTrigger::immediate(ElementId(1), TimelineSpec::new(vec![]));
        assert!(matches!(
            s.register(bad),
            Err(MotionError::InvalidTimelineConfig { .. })
        ));
        assert!(s.handles().is_empty());
    }

    #[test]
    fn shedding_keeps_lifecycle_events() {
        let h = HandleId(0);
        let mut events = vec![
            MotionEvent::Entered { handle: h },
            MotionEvent::Completed { handle: h },
            MotionEvent::Left { handle: h },
            MotionEvent::Disposed { handle: h },
        ];
        assert_eq!(shed_crossings(&mut events, 3), 1);
        assert_eq!(
            events,
            vec![
                MotionEvent::Entered { handle: h },
                MotionEvent::Completed { handle: h },
                MotionEvent::Disposed { handle: h },
            ]
        );

        // no crossings left to shed: stay over budget
        assert_eq!(shed_crossings(&mut events, 1), 1);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn events_flush_on_next_frame() {
        let mut s = Scheduler::new(Config::default(), Headless, NullBackend);
        let h = s.register(fade(1)).unwrap();
        let out = s.frame(0.0);
        assert_eq!(out.epoch, 1);
        assert!(out.events.contains(&MotionEvent::Registered {
            handle: h,
            element: ElementId(1),
            key: None
        }));
        assert!(out.writes.is_empty());
        assert!(s.frame(16.0).events.is_empty());
    }
}
