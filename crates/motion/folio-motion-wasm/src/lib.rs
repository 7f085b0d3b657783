use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use log::warn;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use folio_motion_core::{
    AnimationBackend, AnimationTrigger, Capability, Config, DeferredGate, DeferredLayers,
    DisposeOutcome, ElementId, Environment, FrameRequestId, HandleId, Layer, ListenerId,
    LoadSignal, LoadState, MotionEvent, ObserverId, PerformanceEntry, PropertyValue, Rect,
    Scheduler, SmoothScroller, SubscriptionId, Timeline, TimerId, ToggleAction, Viewport,
    VitalsRecorder,
};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn method(host: &JsValue, name: &str) -> Option<Function> {
    if jsvalue_is_undefined_or_null(host) {
        return None;
    }
    Reflect::get(host, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// Run `callback` in a microtask, once the current call into [`FolioMotion`]
/// has returned, so it can call back in. Whatever it throws reaches the host
/// as an uncaught error.
fn defer(callback: &Function) {
    let global = js_sys::global();
    if let Some(queue) = method(&global, "queueMicrotask") {
        match queue.call1(&global, callback) {
            Ok(_) => return,
            Err(e) => warn!("queueMicrotask failed: {e:?}"),
        }
    }
    let promise = Promise::resolve(&JsValue::UNDEFINED);
    let queued = method(&promise, "then").map(|then| then.call1(&promise, callback));
    if !matches!(queued, Some(Ok(_))) {
        warn!("content-ready callback could not be scheduled: {queued:?}");
    }
}

/// Host-issued ids come back as JS numbers.
fn id_from(v: JsValue) -> Option<u32> {
    v.as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as u32)
}

/// [`Environment`] over a JS host object. Every method is optional; a missing
/// method is a missing capability and a throwing one is treated as absent.
struct JsEnvironment {
    host: JsValue,
    rect: Option<Function>,
    viewport: Option<Function>,
    add_scroll_listener: Option<Function>,
    remove_scroll_listener: Option<Function>,
    request_frame: Option<Function>,
    cancel_frame: Option<Function>,
    set_timeout: Option<Function>,
    clear_timeout: Option<Function>,
    observe_largest_paint: Option<Function>,
    disconnect_observer: Option<Function>,
    prefers_reduced_motion: Option<Function>,
}

impl JsEnvironment {
    fn new(host: JsValue) -> Self {
        Self {
            rect: method(&host, "rect"),
            viewport: method(&host, "viewport"),
            add_scroll_listener: method(&host, "addScrollListener"),
            remove_scroll_listener: method(&host, "removeScrollListener"),
            request_frame: method(&host, "requestFrame"),
            cancel_frame: method(&host, "cancelFrame"),
            set_timeout: method(&host, "setTimeout"),
            clear_timeout: method(&host, "clearTimeout"),
            observe_largest_paint: method(&host, "observeLargestPaint"),
            disconnect_observer: method(&host, "disconnectObserver"),
            prefers_reduced_motion: method(&host, "prefersReducedMotion"),
            host,
        }
    }

    fn call0(&self, f: &Option<Function>) -> Option<JsValue> {
        f.as_ref()?.call0(&self.host).ok()
    }

    fn call1(&self, f: &Option<Function>, arg: u32) -> Option<JsValue> {
        f.as_ref()?.call1(&self.host, &JsValue::from(arg)).ok()
    }
}

impl Environment for JsEnvironment {
    fn is_available(&self, capability: Capability) -> bool {
        match capability {
            Capability::Geometry => self.rect.is_some() && self.viewport.is_some(),
            Capability::ScrollEvents => {
                self.add_scroll_listener.is_some() && self.remove_scroll_listener.is_some()
            }
            Capability::AnimationFrame => self.request_frame.is_some(),
            Capability::Timers => self.set_timeout.is_some(),
            Capability::LargestPaint => self.observe_largest_paint.is_some(),
        }
    }

    fn viewport(&self) -> Option<Viewport> {
        let v = self.call0(&self.viewport)?;
        swb::from_value(v).ok()
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        let v = self.call1(&self.rect, element.0)?;
        if jsvalue_is_undefined_or_null(&v) {
            return None;
        }
        swb::from_value(v).ok()
    }

    fn add_scroll_listener(&mut self) -> Option<ListenerId> {
        self.call0(&self.add_scroll_listener)
            .and_then(id_from)
            .map(ListenerId)
    }

    fn remove_scroll_listener(&mut self, id: ListenerId) {
        self.call1(&self.remove_scroll_listener, id.0);
    }

    fn request_frame(&mut self) -> Option<FrameRequestId> {
        self.call0(&self.request_frame)
            .and_then(id_from)
            .map(FrameRequestId)
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.call1(&self.cancel_frame, id.0);
    }

    fn set_timeout(&mut self, ms: u32) -> Option<TimerId> {
        self.call1(&self.set_timeout, ms).and_then(id_from).map(TimerId)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.call1(&self.clear_timeout, id.0);
    }

    fn observe_largest_paint(&mut self) -> Option<ObserverId> {
        self.call0(&self.observe_largest_paint)
            .and_then(id_from)
            .map(ObserverId)
    }

    fn disconnect_observer(&mut self, id: ObserverId) {
        self.call1(&self.disconnect_observer, id.0);
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.call0(&self.prefers_reduced_motion)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// [`AnimationBackend`] forwarding to `createTimeline`, `setProperties` and
/// `killTimeline` on the host object, when present.
struct JsBackend {
    host: JsValue,
    create_timeline: Option<Function>,
    set_properties: Option<Function>,
    kill_timeline: Option<Function>,
}

impl JsBackend {
    fn new(host: JsValue) -> Self {
        Self {
            create_timeline: method(&host, "createTimeline"),
            set_properties: method(&host, "setProperties"),
            kill_timeline: method(&host, "killTimeline"),
            host,
        }
    }
}

impl AnimationBackend for JsBackend {
    fn create_timeline(&mut self, handle: HandleId, element: ElementId, timeline: &Timeline) {
        let Some(f) = &self.create_timeline else {
            return;
        };
        let Ok(segments) = swb::to_value(timeline.segments()) else {
            return;
        };
        let _ = f.call3(
            &self.host,
            &JsValue::from(handle.0),
            &JsValue::from(element.0),
            &segments,
        );
    }

    fn set_properties(&mut self, element: ElementId, values: &[PropertyValue]) {
        let Some(f) = &self.set_properties else {
            return;
        };
        if let Ok(values) = swb::to_value(values) {
            let _ = f.call2(&self.host, &JsValue::from(element.0), &values);
        }
    }

    fn kill_timeline(&mut self, handle: HandleId) {
        if let Some(f) = &self.kill_timeline {
            let _ = f.call1(&self.host, &JsValue::from(handle.0));
        }
    }
}

#[wasm_bindgen]
pub struct FolioMotion {
    scheduler: Scheduler<JsEnvironment, JsBackend>,
    gate: DeferredGate,
    gate_reported: bool,
    layers: DeferredLayers,
    scroller: SmoothScroller,
    vitals: VitalsRecorder,
}

#[wasm_bindgen]
impl FolioMotion {
    /// Create a coordinator bound to a JS host object. Pass a config object or
    /// undefined/null for defaults.
    /// Example:
    ///   new FolioMotion(host, { fallback_paint_ms: 500 })
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue, config: JsValue) -> Result<FolioMotion, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        let signal = LoadSignal::new();
        let gate = DeferredGate::new(Rc::clone(&signal), &cfg);
        let layers = DeferredLayers::new(signal);
        let vitals = VitalsRecorder::new(&cfg);
        let scheduler = Scheduler::new(
            cfg,
            JsEnvironment::new(host.clone()),
            JsBackend::new(host),
        );
        Ok(FolioMotion {
            scheduler,
            gate,
            gate_reported: false,
            layers,
            scroller: SmoothScroller::default(),
            vitals,
        })
    }

    /// Register an AnimationTrigger (JSON). Returns the handle (u32).
    #[wasm_bindgen]
    pub fn register(&mut self, trigger: JsValue) -> Result<u32, JsError> {
        let trigger: AnimationTrigger = swb::from_value(trigger)
            .map_err(|e| JsError::new(&format!("register parse error: {e}")))?;
        let handle = self
            .scheduler
            .register(trigger)
            .map_err(|e| JsError::new(&format!("register error: {e}")))?;
        Ok(handle.0)
    }

    /// Release a handle. Returns false when it was already disposed.
    #[wasm_bindgen]
    pub fn dispose(&mut self, handle: u32) -> bool {
        self.scheduler.dispose(HandleId(handle)) == DisposeOutcome::Disposed
    }

    #[wasm_bindgen(js_name = dispose_all)]
    pub fn dispose_all(&mut self) -> u32 {
        self.scheduler.dispose_all() as u32
    }

    /// Handle status as `{ state: "active" | "inert" | "disposed", ... }`, or null.
    #[wasm_bindgen]
    pub fn status(&self, handle: u32) -> Result<JsValue, JsError> {
        match self.scheduler.status(HandleId(handle)) {
            Some(status) => {
                swb::to_value(&status).map_err(|e| JsError::new(&format!("status error: {e}")))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Apply a toggle action ("play", "reverse", ...) to a clocked timeline.
    #[wasm_bindgen]
    pub fn control(&mut self, handle: u32, action: String) -> Result<bool, JsError> {
        let action: ToggleAction = action
            .parse()
            .map_err(|e| JsError::new(&format!("control error: {e}")))?;
        Ok(self.scheduler.control(HandleId(handle), action))
    }

    #[wasm_bindgen(js_name = on_scroll)]
    pub fn on_scroll(&mut self) {
        self.scheduler.on_scroll();
    }

    #[wasm_bindgen(js_name = on_resize)]
    pub fn on_resize(&mut self) {
        self.scheduler.on_resize();
    }

    /// Route a fired host timeout. Returns false when nothing owned it.
    #[wasm_bindgen(js_name = on_timer)]
    pub fn on_timer(&mut self, id: u32) -> bool {
        let timer = TimerId(id);
        if self.gate.on_timeout(self.scheduler.env_mut(), timer) {
            self.report_gate();
            return true;
        }
        self.scheduler.on_timer(timer)
    }

    /// Run one frame at host time `now_ms`. Returns FrameOutputs JSON.
    #[wasm_bindgen]
    pub fn frame(&mut self, now_ms: f64) -> Result<JsValue, JsError> {
        let out = self.scheduler.frame(now_ms);
        swb::to_value(out).map_err(|e| JsError::new(&format!("frame outputs error: {e}")))
    }

    #[wasm_bindgen(js_name = active_count)]
    pub fn active_count(&self) -> u32 {
        self.scheduler.active_count() as u32
    }

    /// Start waiting for the largest paint. Returns true when the gate
    /// signaled immediately (no timer support).
    #[wasm_bindgen(js_name = arm_gate)]
    pub fn arm_gate(&mut self) -> bool {
        let signaled = self.gate.arm(self.scheduler.env_mut()).is_some();
        if signaled {
            self.report_gate();
        }
        signaled
    }

    #[wasm_bindgen(js_name = on_largest_paint)]
    pub fn on_largest_paint(&mut self) -> bool {
        let signaled = self.gate.on_largest_paint(self.scheduler.env_mut()).is_some();
        if signaled {
            self.report_gate();
        }
        signaled
    }

    #[wasm_bindgen(js_name = is_content_ready)]
    pub fn is_content_ready(&self) -> bool {
        self.gate.is_signaled()
    }

    /// Call `callback()` once content is ready, in a microtask after the call
    /// that signaled (or after this call if content is already ready). The
    /// callback may call back into this object. Returns a subscription id for
    /// `off_content_ready`.
    #[wasm_bindgen(js_name = on_content_ready)]
    pub fn on_content_ready(&mut self, callback: Function) -> u32 {
        let id = self.gate.subscribe(move || defer(&callback));
        id.0
    }

    #[wasm_bindgen(js_name = off_content_ready)]
    pub fn off_content_ready(&mut self, id: u32) -> bool {
        self.gate.unsubscribe(SubscriptionId(id))
    }

    /// Queue a background layer (`{ layer: "particles", viewport, theme, seed,
    /// elements }` or `{ layer: "preloader", parts, seed }`). It mounts when
    /// content is ready, or now if it already is. Returns the handles
    /// registered by this call.
    #[wasm_bindgen(js_name = queue_layer)]
    pub fn queue_layer(&mut self, layer: JsValue) -> Result<Vec<u32>, JsError> {
        let layer: Layer = swb::from_value(layer)
            .map_err(|e| JsError::new(&format!("layer parse error: {e}")))?;
        self.layers.queue(layer);
        let handles = self
            .layers
            .mount_ready(&mut self.scheduler)
            .map_err(|e| JsError::new(&format!("layer mount error: {e}")))?;
        Ok(handles.into_iter().map(|h| h.0).collect())
    }

    /// Colour token of the mounted particle field, if any.
    #[wasm_bindgen(js_name = particle_token)]
    pub fn particle_token(&self) -> Option<String> {
        self.layers.particles().map(|f| f.token().to_string())
    }

    /// Advance the mounted preloader. Returns `{ progress, label, phase, exit }`
    /// or null before a preloader layer has mounted.
    #[wasm_bindgen(js_name = advance_preloader)]
    pub fn advance_preloader(&mut self, dt_ms: u32) -> Result<JsValue, JsError> {
        let status = self
            .layers
            .advance_preloader(&mut self.scheduler, dt_ms)
            .map_err(|e| JsError::new(&format!("preloader error: {e}")))?;
        match status {
            Some(status) => {
                swb::to_value(&status).map_err(|e| JsError::new(&format!("preloader error: {e}")))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Maximum smooth-scroll offset (document height minus viewport height).
    #[wasm_bindgen(js_name = set_scroll_limit)]
    pub fn set_scroll_limit(&mut self, limit: f64) {
        self.scroller.set_limit(limit);
    }

    #[wasm_bindgen(js_name = on_wheel)]
    pub fn on_wheel(&mut self, delta_y: f64) {
        self.scroller.on_wheel(delta_y);
    }

    #[wasm_bindgen(js_name = scroll_to)]
    pub fn scroll_to(&mut self, y: f64) {
        self.scroller.scroll_to(y);
    }

    /// Advance the smooth scroller; returns the offset the host should scroll to.
    #[wasm_bindgen(js_name = scroll_tick)]
    pub fn scroll_tick(&mut self, dt_ms: f64) -> f64 {
        self.scroller.tick(dt_ms)
    }

    #[wasm_bindgen(js_name = is_scrolling)]
    pub fn is_scrolling(&self) -> bool {
        self.scroller.is_animating()
    }

    /// Feed a performance entry (`{ entry_type: "paint", start_time }`, ...).
    #[wasm_bindgen(js_name = record_performance_entry)]
    pub fn record_performance_entry(&mut self, entry: JsValue) -> Result<(), JsError> {
        let entry: PerformanceEntry = swb::from_value(entry)
            .map_err(|e| JsError::new(&format!("performance entry error: {e}")))?;
        self.vitals.record(entry);
        Ok(())
    }

    /// Rounded vitals once `elapsed_ms` passes the reporting delay, else null. Reports once.
    #[wasm_bindgen(js_name = take_vitals_report)]
    pub fn take_vitals_report(&mut self, elapsed_ms: f64) -> Result<JsValue, JsError> {
        match self.vitals.take_due_report(elapsed_ms) {
            Some(report) => {
                swb::to_value(&report).map_err(|e| JsError::new(&format!("vitals error: {e}")))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Dispose every handle and release the gate's host resources.
    #[wasm_bindgen]
    pub fn teardown(&mut self) {
        self.scheduler.dispose_all();
        self.gate.teardown(self.scheduler.env_mut());
    }
}

impl FolioMotion {
    fn report_gate(&mut self) {
        if self.gate_reported {
            return;
        }
        if let LoadState::Signaled(source) = self.gate.signal().state() {
            self.gate_reported = true;
            self.scheduler.notify(MotionEvent::GateSignaled { source });
            if let Err(e) = self.layers.mount_ready(&mut self.scheduler) {
                warn!("deferred layers failed to mount: {e}");
            }
        }
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
