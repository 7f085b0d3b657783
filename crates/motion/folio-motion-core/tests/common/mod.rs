#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use folio_motion_core::{
    AnimationBackend, Capability, ElementId, Environment, FrameRequestId, HandleId, ListenerId,
    ObserverId, PropertyValue, Rect, Timeline, TimerId, Viewport,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Scriptable host. Element rects are stored in document coordinates and
/// reported relative to the current scroll position.
#[derive(Debug)]
pub struct FakeEnv {
    pub viewport: Viewport,
    pub elements: HashMap<ElementId, Rect>,
    pub missing: HashSet<Capability>,
    pub reduced_motion: bool,
    next_id: u32,

    pub listeners: HashSet<ListenerId>,
    pub listeners_added: u32,
    pub listeners_removed: u32,
    pub frame_requests: u32,
    pub frames_cancelled: u32,
    pub timers: HashMap<TimerId, u32>,
    pub timers_cleared: u32,
    pub observers: HashSet<ObserverId>,
    pub observers_disconnected: u32,
    pub viewport_reads: Cell<u32>,
    pub rect_reads: Cell<u32>,
}

impl Default for FakeEnv {
    fn default() -> Self {
        Self {
            viewport: Viewport {
                width: 1280.0,
                height: 1000.0,
                scroll_y: 0.0,
                document_height: 5000.0,
            },
            elements: HashMap::new(),
            missing: HashSet::new(),
            reduced_motion: false,
            next_id: 1,
            listeners: HashSet::new(),
            listeners_added: 0,
            listeners_removed: 0,
            frame_requests: 0,
            frames_cancelled: 0,
            timers: HashMap::new(),
            timers_cleared: 0,
            observers: HashSet::new(),
            observers_disconnected: 0,
            viewport_reads: Cell::new(0),
            rect_reads: Cell::new(0),
        }
    }
}

impl FakeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an element at document offset `top` with `height`.
    pub fn with_element(mut self, element: u32, top: f32, height: f32) -> Self {
        self.place(element, top, height);
        self
    }

    pub fn without(mut self, capability: Capability) -> Self {
        self.missing.insert(capability);
        self
    }

    pub fn with_reduced_motion(mut self) -> Self {
        self.reduced_motion = true;
        self
    }

    pub fn place(&mut self, element: u32, top: f32, height: f32) {
        self.elements.insert(
            ElementId(element),
            Rect::new(top, 0.0, self.viewport.width, height),
        );
    }

    pub fn remove(&mut self, element: u32) {
        self.elements.remove(&ElementId(element));
    }

    pub fn scroll_to(&mut self, y: f32) {
        self.viewport.scroll_y = y;
    }

    fn issue(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The single live timer, if exactly one is pending.
    pub fn only_timer(&self) -> Option<(TimerId, u32)> {
        if self.timers.len() != 1 {
            return None;
        }
        self.timers.iter().next().map(|(id, ms)| (*id, *ms))
    }

    pub fn geometry_reads(&self) -> u32 {
        self.viewport_reads.get() + self.rect_reads.get()
    }
}

impl Environment for FakeEnv {
    fn is_available(&self, capability: Capability) -> bool {
        !self.missing.contains(&capability)
    }

    fn viewport(&self) -> Option<Viewport> {
        if self.missing.contains(&Capability::Geometry) {
            return None;
        }
        self.viewport_reads.set(self.viewport_reads.get() + 1);
        Some(self.viewport)
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        if self.missing.contains(&Capability::Geometry) {
            return None;
        }
        self.rect_reads.set(self.rect_reads.get() + 1);
        self.elements.get(&element).map(|r| Rect {
            top: r.top - self.viewport.scroll_y,
            ..*r
        })
    }

    fn add_scroll_listener(&mut self) -> Option<ListenerId> {
        if self.missing.contains(&Capability::ScrollEvents) {
            return None;
        }
        let id = ListenerId(self.issue());
        self.listeners.insert(id);
        self.listeners_added += 1;
        Some(id)
    }

    fn remove_scroll_listener(&mut self, id: ListenerId) {
        assert!(self.listeners.remove(&id), "listener {id:?} released twice");
        self.listeners_removed += 1;
    }

    fn request_frame(&mut self) -> Option<FrameRequestId> {
        if self.missing.contains(&Capability::AnimationFrame) {
            return None;
        }
        self.frame_requests += 1;
        Some(FrameRequestId(self.issue()))
    }

    fn cancel_frame(&mut self, _id: FrameRequestId) {
        self.frames_cancelled += 1;
    }

    fn set_timeout(&mut self, ms: u32) -> Option<TimerId> {
        if self.missing.contains(&Capability::Timers) {
            return None;
        }
        let id = TimerId(self.issue());
        self.timers.insert(id, ms);
        Some(id)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        assert!(self.timers.remove(&id).is_some(), "timer {id:?} cleared twice");
        self.timers_cleared += 1;
    }

    fn observe_largest_paint(&mut self) -> Option<ObserverId> {
        if self.missing.contains(&Capability::LargestPaint) {
            return None;
        }
        let id = ObserverId(self.issue());
        self.observers.insert(id);
        Some(id)
    }

    fn disconnect_observer(&mut self, id: ObserverId) {
        assert!(self.observers.remove(&id), "observer {id:?} disconnected twice");
        self.observers_disconnected += 1;
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}

impl FakeEnv {
    /// Host side of a fired timeout: the id is no longer live.
    pub fn fire_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub created: Vec<(HandleId, ElementId, usize)>,
    pub killed: Vec<HandleId>,
    pub commits: Vec<(ElementId, Vec<PropertyValue>)>,
}

impl RecordingBackend {
    /// Latest committed value for `property` on `element`.
    pub fn last(&self, element: u32, property: &str) -> Option<f32> {
        self.commits
            .iter()
            .rev()
            .filter(|(e, _)| *e == ElementId(element))
            .flat_map(|(_, values)| values.iter())
            .find(|v| v.property.as_str() == property)
            .map(|v| v.value)
    }
}

impl AnimationBackend for RecordingBackend {
    fn create_timeline(&mut self, handle: HandleId, element: ElementId, timeline: &Timeline) {
        self.created
            .push((handle, element, timeline.segments().len()));
    }

    fn set_properties(&mut self, element: ElementId, values: &[PropertyValue]) {
        self.commits.push((element, values.to_vec()));
    }

    fn kill_timeline(&mut self, handle: HandleId) {
        self.killed.push(handle);
    }
}
