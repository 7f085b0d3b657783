#![cfg(target_arch = "wasm32")]
use folio_motion_wasm::{abi_version, FolioMotion};
use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::json;
use serde_wasm_bindgen as swb;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn set(obj: &Object, key: &str, value: &JsValue) {
    Reflect::set(obj, &JsValue::from_str(key), value).unwrap();
}

/// Plain JS objects, not `Map`s, for JSON payloads.
fn js(value: serde_json::Value) -> JsValue {
    value
        .serialize(&swb::Serializer::json_compatible())
        .unwrap()
}

fn get(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap()
}

/// Call a method through JS, as page scripts do.
fn call(obj: &JsValue, name: &str, args: &[JsValue]) -> JsValue {
    let f: Function = get(obj, name).dyn_into().unwrap();
    let args: Array = args.iter().collect();
    Reflect::apply(&f, obj, &args).unwrap()
}

/// Let queued microtasks run.
async fn settle() {
    JsFuture::from(Promise::resolve(&JsValue::UNDEFINED))
        .await
        .unwrap();
}

/// `() => { log.calls += 1 }`
fn counting_callback(log: &Object) -> Function {
    Function::new_with_args("log", "return () => { log.calls = (log.calls || 0) + 1; };")
        .call1(&JsValue::UNDEFINED, log)
        .unwrap()
        .dyn_into()
        .unwrap()
}

/// Host with geometry, listeners, frames and timers; counts what it hands out.
fn full_host() -> Object {
    let host = Object::new();
    set(
        &host,
        "viewport",
        &Function::new_no_args(
            "return { width: 1280, height: 1000, scroll_y: this.scrollY || 0, document_height: 5000 };",
        ),
    );
    set(
        &host,
        "rect",
        &Function::new_with_args(
            "id",
            "return { top: 1000 - (this.scrollY || 0), left: 0, width: 1280, height: 800 };",
        ),
    );
    set(
        &host,
        "addScrollListener",
        &Function::new_no_args("this.added = (this.added || 0) + 1; return this.added;"),
    );
    set(
        &host,
        "removeScrollListener",
        &Function::new_with_args("id", "this.removed = (this.removed || 0) + 1;"),
    );
    set(&host, "requestFrame", &Function::new_no_args("return 1;"));
    set(&host, "cancelFrame", &Function::new_with_args("id", ""));
    set(
        &host,
        "setTimeout",
        &Function::new_with_args("ms", "this.timeoutMs = ms; return 9;"),
    );
    set(&host, "clearTimeout", &Function::new_with_args("id", ""));
    set(
        &host,
        "setProperties",
        &Function::new_with_args("el, values", "this.last = values;"),
    );
    host
}

fn reveal_trigger() -> JsValue {
    let trigger = json!({
        "element": 10,
        "scroll": { "start": "top 70%", "end": "bottom bottom", "scrub": 0.5 },
        "timeline": {
            "steps": [{ "property": "y", "from": 150, "to": 0, "duration": 1, "easing": "none" }]
        }
    });
    js(trigger)
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn construct_with_defaults() {
    assert!(FolioMotion::new(JsValue::UNDEFINED, JsValue::NULL).is_ok());
}

#[wasm_bindgen_test]
fn bad_config_is_an_error() {
    let cfg = js(json!({ "fallback_paint_ms": "soon" }));
    assert!(FolioMotion::new(JsValue::UNDEFINED, cfg).is_err());
}

#[wasm_bindgen_test]
fn empty_host_registers_inert_handles() {
    let mut motion = FolioMotion::new(Object::new().into(), JsValue::UNDEFINED).unwrap();
    let handle = motion.register(reveal_trigger()).unwrap();
    assert_eq!(motion.active_count(), 0);
    let status = motion.status(handle).unwrap();
    assert_eq!(get(&status, "state").as_string().as_deref(), Some("inert"));
    assert!(motion.dispose(handle));
    assert!(!motion.dispose(handle));
}

#[wasm_bindgen_test]
fn invalid_timeline_is_rejected() {
    let mut motion = FolioMotion::new(full_host().into(), JsValue::UNDEFINED).unwrap();
    let bad = js(json!({ "element": 1, "timeline": { "steps": [] } }));
    assert!(motion.register(bad).is_err());
}

#[wasm_bindgen_test]
fn re_registration_releases_previous_listener() {
    let host = full_host();
    let mut motion = FolioMotion::new(host.clone().into(), JsValue::UNDEFINED).unwrap();
    motion.register(reveal_trigger()).unwrap();
    motion.register(reveal_trigger()).unwrap();
    assert_eq!(get(&host, "added").as_f64(), Some(2.0));
    assert_eq!(get(&host, "removed").as_f64(), Some(1.0));
    assert_eq!(motion.active_count(), 1);
}

#[wasm_bindgen_test]
fn frame_commits_through_host() {
    let host = full_host();
    let mut motion = FolioMotion::new(host.clone().into(), JsValue::UNDEFINED).unwrap();
    motion.register(reveal_trigger()).unwrap();
    let out = motion.frame(0.0).unwrap();
    let epoch = get(&out, "epoch").as_f64();
    assert_eq!(epoch, Some(1.0));
    assert!(!get(&host, "last").is_undefined());
}

#[wasm_bindgen_test]
fn gate_falls_back_to_timer() {
    let host = full_host();
    let mut motion = FolioMotion::new(host.clone().into(), JsValue::UNDEFINED).unwrap();
    assert!(!motion.arm_gate());
    assert_eq!(get(&host, "timeoutMs").as_f64(), Some(300.0));
    assert!(!motion.is_content_ready());
    assert!(motion.on_timer(9));
    assert!(motion.is_content_ready());
    assert!(!motion.on_timer(9));
}

#[wasm_bindgen_test]
fn gate_without_timers_signals_on_arm() {
    let mut motion = FolioMotion::new(Object::new().into(), JsValue::UNDEFINED).unwrap();
    assert!(motion.arm_gate());
    assert!(motion.is_content_ready());
}

#[wasm_bindgen_test]
fn vitals_report_after_delay() {
    let mut motion = FolioMotion::new(JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    let entry = js(json!({ "entry_type": "paint", "start_time": 420.4 }));
    motion.record_performance_entry(entry).unwrap();
    assert!(motion.take_vitals_report(1000.0).unwrap().is_null());
    let report = motion.take_vitals_report(5000.0).unwrap();
    assert_eq!(get(&report, "fcp").as_f64(), Some(420.0));
}

#[wasm_bindgen_test]
async fn content_ready_callback_can_register() {
    let host = full_host();
    let motion: JsValue = FolioMotion::new(host.into(), JsValue::UNDEFINED)
        .unwrap()
        .into();
    let log = Object::new();
    let mount: Function = Function::new_with_args(
        "motion, trigger, log",
        "return () => { log.handle = motion.register(trigger); };",
    )
    .call3(&JsValue::UNDEFINED, &motion, &reveal_trigger(), &log)
    .unwrap()
    .dyn_into()
    .unwrap();

    call(&motion, "on_content_ready", &[mount.into()]);
    call(&motion, "arm_gate", &[]);
    assert_eq!(call(&motion, "on_timer", &[JsValue::from(9)]).as_bool(), Some(true));
    // runs after the signaling call returned
    assert!(get(&log, "handle").is_undefined());

    settle().await;
    assert!(get(&log, "handle").as_f64().is_some());
    assert_eq!(call(&motion, "active_count", &[]).as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
async fn unsubscribed_callback_never_runs() {
    let mut motion = FolioMotion::new(full_host().into(), JsValue::UNDEFINED).unwrap();
    let log = Object::new();
    let id = motion.on_content_ready(counting_callback(&log));
    assert!(motion.off_content_ready(id));
    assert!(!motion.off_content_ready(id));

    motion.arm_gate();
    assert!(motion.on_timer(9));
    settle().await;
    assert!(get(&log, "calls").is_undefined());
}

#[wasm_bindgen_test]
async fn late_subscriber_is_called_once() {
    let mut motion = FolioMotion::new(Object::new().into(), JsValue::UNDEFINED).unwrap();
    assert!(motion.arm_gate());
    let log = Object::new();
    motion.on_content_ready(counting_callback(&log));
    settle().await;
    assert_eq!(get(&log, "calls").as_f64(), Some(1.0));

    assert!(!motion.on_largest_paint());
    settle().await;
    assert_eq!(get(&log, "calls").as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
fn particle_layer_waits_for_content() {
    let host = full_host();
    let mut motion = FolioMotion::new(host.into(), JsValue::UNDEFINED).unwrap();
    let layer = js(json!({
        "layer": "particles",
        "viewport": { "width": 375, "height": 800, "scroll_y": 0, "document_height": 800 },
        "theme": "light",
        "seed": 4,
        "elements": [1, 2]
    }));
    assert!(motion.queue_layer(layer).unwrap().is_empty());
    assert_eq!(motion.particle_token(), None);

    motion.arm_gate();
    assert!(motion.on_timer(9));
    assert_eq!(motion.particle_token().as_deref(), Some("secondary/40"));
    assert_eq!(motion.active_count(), 4);
}

#[wasm_bindgen_test]
fn preloader_reports_progress_after_mount() {
    let mut motion = FolioMotion::new(full_host().into(), JsValue::UNDEFINED).unwrap();
    assert!(motion.advance_preloader(100).unwrap().is_null());
    motion.arm_gate();
    motion.on_timer(9);
    let layer = js(json!({ "layer": "preloader", "parts": { "root": 1, "hexagons": [2] }, "seed": 1 }));
    assert_eq!(motion.queue_layer(layer).unwrap().len(), 1);

    let status = motion.advance_preloader(3000).unwrap();
    assert_eq!(get(&status, "progress").as_f64(), Some(100.0));
    assert!(get(&status, "exit").as_f64().is_some());
}

#[wasm_bindgen_test]
fn wheel_scrolls_smoothly_to_the_limit() {
    let mut motion = FolioMotion::new(JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    motion.set_scroll_limit(400.0);
    motion.on_wheel(1000.0);
    assert!(motion.is_scrolling());
    let first = motion.scroll_tick(16.0);
    assert!(first > 0.0 && first < 400.0);
    for _ in 0..500 {
        motion.scroll_tick(16.0);
    }
    assert!(!motion.is_scrolling());
    assert_eq!(motion.scroll_tick(16.0), 400.0);
}
