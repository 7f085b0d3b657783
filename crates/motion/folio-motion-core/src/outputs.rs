//! Output contracts from the scheduler.
//!
//! A frame yields the property writes that survived last-write-wins merging,
//! the conflicts that merging resolved, and a list of semantic events.
//! Adapters commit the writes through their backend and forward the events.

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Degradation;
use crate::gate::SignalSource;
use crate::ids::{ElementId, HandleId};
use crate::playback::Crossing;
use crate::value::{Property, PropertyValue};

/// One committed value and the handle that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyWrite {
    pub handle: HandleId,
    pub element: ElementId,
    pub property: Property,
    pub value: f32,
}

/// Two handles wrote the same (element, property) in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub element: ElementId,
    pub property: Property,
    pub overwritten: HandleId,
    pub overwritten_value: f32,
    pub winner: HandleId,
    pub value: f32,
}

/// Per-frame write set keyed by (element, property).
///
/// Handles are allocated monotonically, so the larger handle is the later
/// registration and wins regardless of push order.
#[derive(Debug, Default)]
pub struct WriteBatch {
    entries: IndexMap<(ElementId, Property), PropertyWrite>,
    conflicts: Vec<Conflict>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: PropertyWrite) {
        let key = (write.element, write.property.clone());
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, write);
            }
            Some(existing) if existing.handle == write.handle => {
                existing.value = write.value;
            }
            Some(existing) => {
                let (winner, loser) = if write.handle > existing.handle {
                    (write, existing.clone())
                } else {
                    (existing.clone(), write)
                };
                self.conflicts.push(Conflict {
                    element: winner.element,
                    property: winner.property.clone(),
                    overwritten: loser.handle,
                    overwritten_value: loser.value,
                    winner: winner.handle,
                    value: winner.value,
                });
                *existing = winner;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, element: ElementId, property: &Property) -> Option<&PropertyWrite> {
        self.entries.get(&(element, property.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyWrite> {
        self.entries.values()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Surviving writes grouped per element, in first-write order.
    pub fn by_element(&self) -> IndexMap<ElementId, Vec<PropertyValue>> {
        let mut grouped: IndexMap<ElementId, Vec<PropertyValue>> = IndexMap::new();
        for w in self.entries.values() {
            grouped
                .entry(w.element)
                .or_default()
                .push(PropertyValue::new(w.property.clone(), w.value));
        }
        grouped
    }

    /// Drop writes to channels a later live registration already owns.
    pub fn yield_to(&mut self, owners: &ChannelOwners) {
        let conflicts = &mut self.conflicts;
        self.entries.retain(|(element, property), write| {
            match owners.get(*element, property) {
                Some((owner, value)) if owner > write.handle => {
                    conflicts.push(Conflict {
                        element: *element,
                        property: property.clone(),
                        overwritten: write.handle,
                        overwritten_value: write.value,
                        winner: owner,
                        value,
                    });
                    false
                }
                _ => true,
            }
        });
    }

    pub fn into_parts(self) -> (Vec<PropertyWrite>, Vec<Conflict>) {
        (self.entries.into_values().collect(), self.conflicts)
    }
}

/// Last committed writer of each (element, property), kept across frames.
///
/// A handle only writes when its own output changes, so a settled later
/// registration would otherwise lose its channel to an earlier one that is
/// still lagging.
#[derive(Debug, Default)]
pub struct ChannelOwners {
    owners: HashMap<(ElementId, Property), (HandleId, f32)>,
}

impl ChannelOwners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owning handle and the value it last committed.
    pub fn get(&self, element: ElementId, property: &Property) -> Option<(HandleId, f32)> {
        self.owners.get(&(element, property.clone())).copied()
    }

    /// Record writes that survived [`WriteBatch::yield_to`].
    pub fn commit(&mut self, writes: &[PropertyWrite]) {
        for w in writes {
            self.owners
                .insert((w.element, w.property.clone()), (w.handle, w.value));
        }
    }

    /// Give up every channel `handle` owns. Returns how many were released.
    pub fn release(&mut self, handle: HandleId) -> usize {
        let before = self.owners.len();
        self.owners.retain(|_, (owner, _)| *owner != handle);
        before - self.owners.len()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Discrete signals emitted by the scheduler and the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionEvent {
    Registered {
        handle: HandleId,
        element: ElementId,
        key: Option<String>,
    },
    Disposed {
        handle: HandleId,
    },
    /// Re-registration of a logical trigger disposed `previous`.
    Replaced {
        previous: HandleId,
        handle: HandleId,
    },
    Entered {
        handle: HandleId,
    },
    Left {
        handle: HandleId,
    },
    EnteredBack {
        handle: HandleId,
    },
    LeftBack {
        handle: HandleId,
    },
    Completed {
        handle: HandleId,
    },
    PinChanged {
        handle: HandleId,
        element: ElementId,
        pinned: bool,
    },
    Degraded {
        handle: HandleId,
        reason: Degradation,
    },
    GateSignaled {
        source: SignalSource,
    },
}

impl MotionEvent {
    /// Band crossings are the first events shed when a frame overflows.
    pub fn is_crossing(&self) -> bool {
        matches!(
            self,
            MotionEvent::Entered { .. }
                | MotionEvent::Left { .. }
                | MotionEvent::EnteredBack { .. }
                | MotionEvent::LeftBack { .. }
        )
    }

    pub fn crossing(handle: HandleId, crossing: Crossing) -> Self {
        match crossing {
            Crossing::Enter => MotionEvent::Entered { handle },
            Crossing::Leave => MotionEvent::Left { handle },
            Crossing::EnterBack => MotionEvent::EnteredBack { handle },
            Crossing::LeaveBack => MotionEvent::LeftBack { handle },
        }
    }
}

/// Everything one call to [`Scheduler::frame`](crate::Scheduler::frame) produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameOutputs {
    pub epoch: u64,
    pub writes: Vec<PropertyWrite>,
    pub conflicts: Vec<Conflict>,
    pub events: Vec<MotionEvent>,
}

impl FrameOutputs {
    pub fn value_of(&self, element: ElementId, property: &Property) -> Option<f32> {
        self.writes
            .iter()
            .find(|w| w.element == element && &w.property == property)
            .map(|w| w.value)
    }
}
