//! Background layers held back by the deferred gate.
//!
//! Layers are queued at any time and registered with the scheduler by
//! [`DeferredLayers::mount_ready`] once the shared [`LoadSignal`] has fired.
//! Mounting is an explicit call rather than a gate subscriber so hosts never
//! re-enter the scheduler from inside a gate notification.

use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::environment::{AnimationBackend, Environment};
use crate::error::MotionError;
use crate::gate::LoadSignal;
use crate::geometry::Viewport;
use crate::ids::{ElementId, HandleId};
use crate::particles::{ParticleField, Theme};
use crate::preloader::{self, LoadingLabel, Preloader, PreloaderParts, PreloaderPhase};
use crate::scheduler::Scheduler;
use crate::trigger::AnimationTrigger;

/// A layer waiting for the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum Layer {
    /// Particle field over `elements`, one element per particle.
    Particles {
        viewport: Viewport,
        #[serde(default)]
        theme: Theme,
        #[serde(default)]
        seed: u32,
        elements: Vec<ElementId>,
    },
    /// Loading splash: ambient loops on mount, exit once loading completes.
    Preloader {
        parts: PreloaderParts,
        #[serde(default)]
        seed: u32,
    },
}

/// Progress of the mounted splash, for the host's counter and label.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloaderStatus {
    pub progress: u32,
    pub label: LoadingLabel,
    pub phase: PreloaderPhase,
    /// Handle of the exit timeline, once registered.
    pub exit: Option<HandleId>,
}

#[derive(Debug)]
struct Splash {
    state: Preloader,
    parts: PreloaderParts,
    exit: Option<HandleId>,
}

#[derive(Debug)]
pub struct DeferredLayers {
    signal: Rc<LoadSignal>,
    queued: Vec<Layer>,
    mounted: Vec<HandleId>,
    particles: Option<ParticleField>,
    splash: Option<Splash>,
}

impl DeferredLayers {
    pub fn new(signal: Rc<LoadSignal>) -> Self {
        Self {
            signal,
            queued: Vec::new(),
            mounted: Vec::new(),
            particles: None,
            splash: None,
        }
    }

    pub fn queue(&mut self, layer: Layer) {
        self.queued.push(layer);
    }

    pub fn pending(&self) -> usize {
        self.queued.len()
    }

    /// Every handle registered for mounted layers, in mount order.
    pub fn mounted(&self) -> &[HandleId] {
        &self.mounted
    }

    pub fn particles(&self) -> Option<&ParticleField> {
        self.particles.as_ref()
    }

    /// Register queued layers if the signal has fired. Returns the handles
    /// registered by this call; empty while the gate is still closed.
    pub fn mount_ready<E: Environment, B: AnimationBackend>(
        &mut self,
        scheduler: &mut Scheduler<E, B>,
    ) -> Result<Vec<HandleId>, MotionError> {
        if !self.signal.is_signaled() || self.queued.is_empty() {
            return Ok(Vec::new());
        }
        let mut handles = Vec::new();
        for layer in std::mem::take(&mut self.queued) {
            for trigger in self.prepare(layer) {
                handles.push(scheduler.register(trigger)?);
            }
        }
        debug!("mounted deferred layers: {} handles", handles.len());
        self.mounted.extend(&handles);
        Ok(handles)
    }

    fn prepare(&mut self, layer: Layer) -> Vec<AnimationTrigger> {
        match layer {
            Layer::Particles {
                viewport,
                theme,
                seed,
                elements,
            } => {
                let field = ParticleField::generate(&viewport, theme, seed);
                let triggers = field.triggers(&elements);
                self.particles = Some(field);
                triggers
            }
            Layer::Preloader { parts, seed } => {
                let triggers = preloader::ambient_triggers(&parts);
                self.splash = Some(Splash {
                    state: Preloader::new(seed),
                    parts,
                    exit: None,
                });
                triggers
            }
        }
    }

    /// Advance the mounted splash by `dt_ms`, registering its exit timeline
    /// when due. `None` until a preloader layer has mounted.
    pub fn advance_preloader<E: Environment, B: AnimationBackend>(
        &mut self,
        scheduler: &mut Scheduler<E, B>,
        dt_ms: u32,
    ) -> Result<Option<PreloaderStatus>, MotionError> {
        let Some(splash) = self.splash.as_mut() else {
            return Ok(None);
        };
        if splash.state.advance(dt_ms) {
            let handle = scheduler.register(preloader::exit_trigger(&splash.parts))?;
            debug!("preloader exit as {handle}");
            splash.exit = Some(handle);
            self.mounted.push(handle);
        }
        Ok(Some(PreloaderStatus {
            progress: splash.state.progress(),
            label: splash.state.label(),
            phase: splash.state.phase(),
            exit: splash.exit,
        }))
    }
}
