//! Deferred-work gate.
//!
//! Holds back non-essential visuals (particle field, preloader) until the
//! primary content has painted. [`LoadSignal`] is the shared one-way flag;
//! [`DeferredGate`] owns the host resources that flip it: a largest-paint
//! observer and a bounded fallback timer, whichever fires first.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::environment::Environment;
use crate::error::Capability;
use crate::ids::{IdAllocator, ObserverId, SubscriptionId, TimerId};

/// What flipped the signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    LargestPaint,
    FallbackTimer,
    /// The host has no timers; content is treated as ready at once.
    Unsupported,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Pending,
    Signaled(SignalSource),
}

/// "Primary content painted". Starts pending; the only transition is to signaled.
#[derive(Debug, Default)]
pub struct LoadSignal {
    state: Cell<LoadState>,
}

impl LoadSignal {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    #[inline]
    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    #[inline]
    pub fn is_signaled(&self) -> bool {
        matches!(self.state.get(), LoadState::Signaled(_))
    }

    /// Returns true only for the call that performed the transition.
    pub(crate) fn signal(&self, source: SignalSource) -> bool {
        if self.is_signaled() {
            return false;
        }
        self.state.set(LoadState::Signaled(source));
        true
    }
}

type Subscriber = Box<dyn FnOnce()>;

pub struct DeferredGate {
    signal: Rc<LoadSignal>,
    fallback_ms: u32,
    armed: bool,
    timer: Option<TimerId>,
    observer: Option<ObserverId>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    ids: IdAllocator,
}

impl fmt::Debug for DeferredGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredGate")
            .field("state", &self.signal.state())
            .field("fallback_ms", &self.fallback_ms)
            .field("armed", &self.armed)
            .field("timer", &self.timer)
            .field("observer", &self.observer)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl DeferredGate {
    pub fn new(signal: Rc<LoadSignal>, cfg: &Config) -> Self {
        Self {
            signal,
            fallback_ms: cfg.fallback_paint_ms,
            armed: false,
            timer: None,
            observer: None,
            subscribers: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    pub fn signal(&self) -> &Rc<LoadSignal> {
        &self.signal
    }

    pub fn is_signaled(&self) -> bool {
        self.signal.is_signaled()
    }

    /// Fallback timer currently held, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Start observing. Without timers the gate signals immediately.
    /// Returns the source when this call flipped the signal.
    pub fn arm<E: Environment>(&mut self, env: &mut E) -> Option<SignalSource> {
        if self.armed || self.signal.is_signaled() {
            return None;
        }
        self.armed = true;
        if env.is_available(Capability::LargestPaint) {
            self.observer = env.observe_largest_paint();
        }
        if env.is_available(Capability::Timers) {
            self.timer = env.set_timeout(self.fallback_ms);
        }
        if self.timer.is_none() {
            debug!("deferred gate: no fallback timer available, signalling now");
            return self.fire(env, SignalSource::Unsupported);
        }
        debug!(
            "deferred gate armed: fallback {} ms, paint observer {}",
            self.fallback_ms,
            self.observer.is_some()
        );
        None
    }

    pub fn on_largest_paint<E: Environment>(&mut self, env: &mut E) -> Option<SignalSource> {
        self.fire(env, SignalSource::LargestPaint)
    }

    /// Route a host timeout. Returns false when `id` is not the gate's timer.
    pub fn on_timeout<E: Environment>(&mut self, env: &mut E, id: TimerId) -> bool {
        if self.timer != Some(id) {
            return false;
        }
        // already fired on the host side; nothing to clear
        self.timer = None;
        self.fire(env, SignalSource::FallbackTimer);
        true
    }

    /// Run `f` once the content is ready: now if already signaled, else on the transition.
    pub fn subscribe(&mut self, f: impl FnOnce() + 'static) -> SubscriptionId {
        let id = self.ids.alloc_subscription();
        if self.signal.is_signaled() {
            f();
        } else {
            self.subscribers.push((id, Box::new(f)));
        }
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Release host resources and drop pending subscribers. The signal keeps its state.
    pub fn teardown<E: Environment>(&mut self, env: &mut E) {
        self.release(env);
        self.subscribers.clear();
        self.armed = false;
    }

    fn release<E: Environment>(&mut self, env: &mut E) {
        if let Some(timer) = self.timer.take() {
            env.clear_timeout(timer);
        }
        if let Some(observer) = self.observer.take() {
            env.disconnect_observer(observer);
        }
    }

    fn fire<E: Environment>(&mut self, env: &mut E, source: SignalSource) -> Option<SignalSource> {
        if !self.signal.signal(source) {
            return None;
        }
        self.release(env);
        debug!(
            "deferred gate signaled by {source:?}; waking {} subscribers",
            self.subscribers.len()
        );
        for (_, f) in std::mem::take(&mut self.subscribers) {
            f();
        }
        Some(source)
    }
}
