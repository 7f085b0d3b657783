//! Folio Motion Core (host-agnostic)
//!
//! Scroll-synchronized animation coordination: scroll bands and progress, timeline
//! compilation and sampling, visibility-gated playback, a read/compute/write frame
//! scheduler with last-write-wins property merging, a deferred load gate and the
//! background layers it holds back. The host supplies geometry, listeners, frames
//! and timers through [`Environment`] and receives property writes through
//! [`AnimationBackend`] and [`FrameOutputs`].

pub mod band;
pub mod config;
pub mod easing;
pub mod environment;
pub mod error;
pub mod gate;
pub mod geometry;
pub mod ids;
pub mod layers;
pub mod outputs;
pub mod particles;
pub mod playback;
pub mod preloader;
pub mod presets;
pub mod rng;
pub mod scheduler;
pub mod smooth_scroll;
pub mod timeline;
pub mod tracker;
pub mod trigger;
pub mod value;
pub mod vitals;

// Re-exports for consumers (adapters)
pub use band::{Anchor, BandEdge, ScrollBand};
pub use config::{Config, ReducedMotionPolicy};
pub use easing::{lerp, EaseKind, Easing};
pub use environment::{AnimationBackend, Environment, Headless, NullBackend};
pub use error::{Capability, Degradation, MotionError, TimelineConfigError};
pub use gate::{DeferredGate, LoadSignal, LoadState, SignalSource};
pub use geometry::{Rect, Viewport};
pub use ids::{
    ElementId, FrameRequestId, HandleId, IdAllocator, ListenerId, ObserverId, SubscriptionId,
    TimerId,
};
pub use layers::{DeferredLayers, Layer, PreloaderStatus};
pub use outputs::{ChannelOwners, Conflict, FrameOutputs, MotionEvent, PropertyWrite, WriteBatch};
pub use particles::{ParticleField, Theme};
pub use playback::{Crossing, GatedTimeline, PlaybackMode, Region, ToggleAction, ToggleActions};
pub use preloader::{LoadingLabel, Preloader, PreloaderParts, PreloaderPhase};
pub use scheduler::{DisposeOutcome, HandleStatus, Scheduler};
pub use smooth_scroll::SmoothScroller;
pub use timeline::{Repeat, StepPosition, Timeline, TimelineSpec, TimelineStep};
pub use tracker::ScrollTracker;
pub use trigger::{AnimationTrigger, ScrollTriggerSpec};
pub use value::{Property, PropertyValue};
pub use vitals::{PerformanceEntry, VitalsRecorder, VitalsReport};
