//! Browser tests for the JavaScript facade.
#![cfg(target_arch = "wasm32")]

use bucket_timeline_wasm::BucketTimelineWasm;
use js_sys::{Array, Function, Reflect, JSON};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const DAY: f64 = 86_400_000.0;
/// 2024-03-10T00:00:00Z
const MARCH_10: f64 = 1_710_028_800_000.0;

fn items(json: &str) -> Array {
    Array::from(&JSON::parse(json).unwrap())
}

fn get_t() -> Function {
    Function::new_with_args("item", "return item.t")
}

fn ten_seconds() -> Function {
    Function::new_with_args(
        "min, max",
        "const out = []; \
         for (let s = min; s <= max; s += 10000) out.push([s, s + 10000, 'w' + s]); \
         return out;",
    )
}

fn prop(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn init_routes_tracing_to_console() {
    bucket_timeline_wasm::init();
    bucket_timeline_wasm::init();
    assert!(tracing::dispatcher::has_been_set());
}

#[wasm_bindgen_test]
fn default_config() {
    let timeline = BucketTimelineWasm::new(JsValue::UNDEFINED).unwrap();
    assert_eq!(timeline.bucket_count(), 0);
    assert_eq!(timeline.layer_count(), 0);
    assert!(timeline.get_root_ids().is_empty());
}

#[wasm_bindgen_test]
fn rejects_bad_config() {
    let config = JSON::parse(r#"{"utcOffsetMinutes": 5000}"#).unwrap();
    assert!(BucketTimelineWasm::new(config).is_err());

    let config = JSON::parse(r#"{"granularities": [{"kind": "fixed", "stepMs": -1}]}"#).unwrap();
    assert!(BucketTimelineWasm::new(config).is_err());
}

#[wasm_bindgen_test]
fn collect_leaves_accepts_every_entry_shape() {
    let mut timeline = BucketTimelineWasm::new(JsValue::UNDEFINED).unwrap();
    let data = items(&format!(
        r#"[
            {{"t": {MARCH_10}, "d": true}},
            {{"t": {{"start": {MARCH_10}, "end": {}}}}},
            {{"t": [1, 2]}},
            {{"t": null}},
            {{}}
        ]"#,
        MARCH_10 + DAY
    ));
    let accessor = Function::new_with_args("item", "return item.d ? new Date(item.t) : item.t");

    let leaves = timeline.collect_leaves(data, &accessor).unwrap();
    assert_eq!(leaves, 5, "date + two interval days + two array entries");
    assert_eq!(timeline.layer_count(), 1);
}

#[wasm_bindgen_test]
fn aggregate_with_js_granularity() {
    let mut timeline = BucketTimelineWasm::new(JsValue::UNDEFINED).unwrap();
    let data = items(r#"[{"t": 12000, "name": "c"}, {"t": 1000, "name": "a"}, {"t": 4000, "name": "b"}]"#);
    let fns = Array::of1(&ten_seconds());

    let groups = timeline.aggregate_with(data, &get_t(), fns).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(timeline.get_root_ids(), groups);

    let first = timeline.get_bucket(groups[0]).unwrap();
    assert_eq!(prop(&first, "type").as_string().as_deref(), Some("group"));
    assert_eq!(prop(&first, "aggregatedValue").as_f64(), Some(2.0));
    assert_eq!(prop(&first, "label").as_string().as_deref(), Some("w1000"));

    let leaves = timeline.get_leaves_of(groups[0]).unwrap();
    let names: Vec<String> = leaves
        .iter()
        .filter_map(|item| prop(&item, "name").as_string())
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    // One edge per leaf.
    assert_eq!(timeline.get_edge_pairs().len(), 6);
    assert_eq!(timeline.find_buckets_at(5000.0, 1), vec![groups[0]]);
    assert_eq!(timeline.find_nearest_bucket(30000.0, 1), Some(groups[1]));
}

#[wasm_bindgen_test]
fn object_slices_and_config_granularities() {
    let config = JSON::parse(r#"{"granularities": [{"kind": "day"}, {"kind": "month"}]}"#).unwrap();
    let mut timeline = BucketTimelineWasm::new(config).unwrap();
    let data = items(&format!(r#"[{{"t": {MARCH_10}}}, {{"t": {}}}]"#, MARCH_10 + DAY));

    let groups = timeline.aggregate(data.clone(), &get_t()).unwrap();
    assert_eq!(groups.len(), 3, "two days and one month");
    let stats = timeline.get_layer_stats().unwrap();
    assert_eq!(Array::from(&stats).length(), 2);

    let whole = Function::new_with_args("min, max", "return [{start: min, end: max + 1, label: 'all'}]");
    let groups = timeline
        .aggregate_with(data, &get_t(), Array::of1(&whole))
        .unwrap();
    assert_eq!(groups.len(), 1);
    let bucket = timeline.get_bucket(groups[0]).unwrap();
    assert_eq!(prop(&bucket, "aggregatedValue").as_f64(), Some(2.0));
}

#[wasm_bindgen_test]
fn throwing_granularity_keeps_previous_tree() {
    let mut timeline = BucketTimelineWasm::new(JsValue::UNDEFINED).unwrap();
    let data = items(r#"[{"t": 1000}, {"t": 4000}]"#);
    timeline
        .aggregate_with(data.clone(), &get_t(), Array::of1(&ten_seconds()))
        .unwrap();
    let before = timeline.bucket_count();

    let broken = Function::new_with_args("min, max", "throw new Error('boom')");
    let err = timeline
        .aggregate_with(data, &get_t(), Array::of1(&broken))
        .unwrap_err();
    assert!(err.as_string().unwrap().contains("boom"));
    assert_eq!(timeline.bucket_count(), before);
}

#[wasm_bindgen_test]
fn unknown_bucket_and_clear() {
    let mut timeline = BucketTimelineWasm::new(JsValue::UNDEFINED).unwrap();
    timeline
        .collect_leaves(items(r#"[{"t": 1}]"#), &get_t())
        .unwrap();
    assert!(timeline.get_bucket(99).is_err());
    assert_eq!(timeline.get_bucket_for_node(0), Some(0));

    timeline.clear();
    assert_eq!(timeline.bucket_count(), 0);
    assert!(timeline.find_buckets_in_range(0.0, 10.0).is_empty());
}
