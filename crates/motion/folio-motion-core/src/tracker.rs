//! Scroll position tracking.
//!
//! Scroll and resize notifications only mark the tracker dirty; geometry is
//! read in one pass when the next frame runs, so a burst of scroll events
//! costs one measurement.

use indexmap::IndexMap;
use log::trace;

use crate::band::ScrollBand;
use crate::environment::Environment;
use crate::geometry::Viewport;
use crate::ids::{ElementId, HandleId};

#[derive(Clone, Debug)]
struct Tracked {
    element: ElementId,
    band: ScrollBand,
    raw: Option<f32>,
}

#[derive(Debug, Default)]
pub struct ScrollTracker {
    entries: IndexMap<HandleId, Tracked>,
    viewport: Option<Viewport>,
    dirty: bool,
    measure_passes: u64,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, handle: HandleId, element: ElementId, band: ScrollBand) {
        self.entries.insert(
            handle,
            Tracked {
                element,
                band,
                raw: None,
            },
        );
        self.dirty = true;
    }

    pub fn untrack(&mut self, handle: HandleId) -> bool {
        self.entries.shift_remove(&handle).is_some()
    }

    /// Scroll or resize happened.
    #[inline]
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of geometry passes performed so far.
    pub fn measure_passes(&self) -> u64 {
        self.measure_passes
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Read geometry for every tracked element if dirty. Returns whether a pass ran.
    pub fn measure<E: Environment>(&mut self, env: &E) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.measure_passes += 1;
        self.viewport = env.viewport();
        let Some(viewport) = self.viewport else {
            for entry in self.entries.values_mut() {
                entry.raw = None;
            }
            return true;
        };
        for entry in self.entries.values_mut() {
            entry.raw = env
                .element_rect(entry.element)
                .map(|rect| entry.band.raw_progress(&rect, &viewport));
        }
        trace!(
            "measured {} tracked elements at scroll {}",
            self.entries.len(),
            viewport.scroll_y
        );
        true
    }

    /// Unclamped band progress from the last pass; `None` when the element was not found.
    pub fn raw(&self, handle: HandleId) -> Option<f32> {
        self.entries.get(&handle).and_then(|e| e.raw)
    }

    /// Band progress clamped to `[0, 1]`.
    pub fn progress(&self, handle: HandleId) -> Option<f32> {
        self.raw(handle).map(|r| r.clamp(0.0, 1.0))
    }
}
