//! Host capability seams.
//!
//! The core never touches a render tree directly. [`Environment`] supplies
//! geometry, event subscriptions and timers; [`AnimationBackend`] receives
//! committed property values. Adapters (wasm, tests) implement both.

use crate::error::Capability;
use crate::geometry::{Rect, Viewport};
use crate::ids::{ElementId, FrameRequestId, HandleId, ListenerId, ObserverId, TimerId};
use crate::timeline::Timeline;
use crate::value::PropertyValue;

/// Host services consumed by the scheduler and the deferred gate.
///
/// Acquire methods return `None` when the capability is missing; release
/// methods are only called with ids the host issued, and at most once each.
/// Notifications flow back through [`Scheduler::on_scroll`](crate::Scheduler::on_scroll),
/// [`Scheduler::frame`](crate::Scheduler::frame), [`Scheduler::on_timer`](crate::Scheduler::on_timer)
/// and [`DeferredGate::on_largest_paint`](crate::DeferredGate::on_largest_paint).
pub trait Environment {
    fn is_available(&self, capability: Capability) -> bool;

    fn viewport(&self) -> Option<Viewport>;

    /// Bounding rect relative to the viewport; `None` when the element is not rendered.
    fn element_rect(&self, element: ElementId) -> Option<Rect>;

    fn add_scroll_listener(&mut self) -> Option<ListenerId>;
    fn remove_scroll_listener(&mut self, id: ListenerId);

    fn request_frame(&mut self) -> Option<FrameRequestId>;
    fn cancel_frame(&mut self, id: FrameRequestId);

    fn set_timeout(&mut self, ms: u32) -> Option<TimerId>;
    fn clear_timeout(&mut self, id: TimerId);

    fn observe_largest_paint(&mut self) -> Option<ObserverId>;
    fn disconnect_observer(&mut self, id: ObserverId);

    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}

/// Server-side / non-browser host: nothing is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Environment for Headless {
    fn is_available(&self, _capability: Capability) -> bool {
        false
    }

    fn viewport(&self) -> Option<Viewport> {
        None
    }

    fn element_rect(&self, _element: ElementId) -> Option<Rect> {
        None
    }

    fn add_scroll_listener(&mut self) -> Option<ListenerId> {
        None
    }

    fn remove_scroll_listener(&mut self, _id: ListenerId) {}

    fn request_frame(&mut self) -> Option<FrameRequestId> {
        None
    }

    fn cancel_frame(&mut self, _id: FrameRequestId) {}

    fn set_timeout(&mut self, _ms: u32) -> Option<TimerId> {
        None
    }

    fn clear_timeout(&mut self, _id: TimerId) {}

    fn observe_largest_paint(&mut self) -> Option<ObserverId> {
        None
    }

    fn disconnect_observer(&mut self, _id: ObserverId) {}
}

/// Receiver of timelines and committed values.
pub trait AnimationBackend {
    /// A handle went live with this compiled timeline.
    fn create_timeline(&mut self, handle: HandleId, element: ElementId, timeline: &Timeline);

    /// Commit values for one element. Called once per element per frame, after all reads.
    fn set_properties(&mut self, element: ElementId, values: &[PropertyValue]);

    /// The handle was disposed or replaced; no further writes will name it.
    fn kill_timeline(&mut self, handle: HandleId);
}

/// Backend that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl AnimationBackend for NullBackend {
    fn create_timeline(&mut self, _handle: HandleId, _element: ElementId, _timeline: &Timeline) {}

    fn set_properties(&mut self, _element: ElementId, _values: &[PropertyValue]) {}

    fn kill_timeline(&mut self, _handle: HandleId) {}
}
