//! Conversions between JavaScript values and aggregation inputs.
//!
//! Time accessors and granularities supplied from JS are plain functions;
//! this module decodes what they return into `TimeEntries` and `TimeSlice`s.

use std::cell::RefCell;

use js_sys::{Array, Date, Function, Reflect};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};

use crate::aggregation::{Granularity, TimeEntries, TimeEntry, TimeSlice};
use crate::error::{TimelineError, TimelineResult};

fn field(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Milliseconds from a number or a `Date`.
fn time_of(value: &JsValue) -> Option<i64> {
    let ms = match value.dyn_ref::<Date>() {
        Some(date) => date.get_time(),
        None => value.as_f64()?,
    };
    ms.is_finite().then_some(ms as i64)
}

fn entry_of(value: &JsValue) -> Option<TimeEntry> {
    if let Some(at) = time_of(value) {
        return Some(TimeEntry::Instant(at));
    }
    if value.is_object() {
        let start = time_of(&field(value, "start"))?;
        let end = time_of(&field(value, "end"))?;
        return Some(TimeEntry::Interval { start, end });
    }
    None
}

fn entry_or_warn(value: &JsValue) -> Option<TimeEntry> {
    let entry = entry_of(value);
    if entry.is_none() {
        warn!(?value, "ignoring unrecognised time entry");
    }
    entry
}

/// Decode what a JS time accessor returned.
///
/// Accepts a number, a `Date`, `{start, end}`, or an array of those.
/// `null` and `undefined` mean the item has no time.
pub(crate) fn time_entries_from_js(value: &JsValue) -> Option<TimeEntries> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    if Array::is_array(value) {
        let entries = Array::from(value)
            .iter()
            .filter(|entry| !entry.is_null() && !entry.is_undefined())
            .filter_map(|entry| entry_or_warn(&entry))
            .collect();
        return Some(TimeEntries::Many(entries));
    }
    entry_or_warn(value).map(TimeEntries::One)
}

/// Wrap a JS `item => timeEntry` function as a fallible accessor.
pub(crate) fn time_accessor(
    function: &Function,
) -> impl FnMut(&JsValue) -> TimelineResult<Option<TimeEntries>> + '_ {
    move |item| {
        let value = function
            .call1(&JsValue::NULL, item)
            .map_err(|thrown| TimelineError::callback(&thrown))?;
        Ok(time_entries_from_js(&value))
    }
}

/// Decode `[start, end, label?]` or `{start, end, label?}`.
fn slice_from_js(value: &JsValue) -> TimelineResult<TimeSlice> {
    let (start, end, label) = if Array::is_array(value) {
        let parts = Array::from(value);
        (parts.get(0), parts.get(1), parts.get(2))
    } else if value.is_object() {
        (field(value, "start"), field(value, "end"), field(value, "label"))
    } else {
        return Err(TimelineError::InvalidSlice(format!(
            "expected [start, end, label?] or {{start, end, label?}}, got {value:?}"
        )));
    };

    let start = time_of(&start)
        .ok_or_else(|| TimelineError::InvalidSlice(format!("bad slice start {start:?}")))?;
    let end = time_of(&end)
        .ok_or_else(|| TimelineError::InvalidSlice(format!("bad slice end {end:?}")))?;
    if end < start {
        return Err(TimelineError::InvalidSlice(format!(
            "slice ends before it starts: [{start}, {end}]"
        )));
    }

    Ok(TimeSlice {
        start,
        end,
        label: label.as_string(),
    })
}

/// A granularity backed by a JS `(min, max) => slices` function.
///
/// The sweep cannot fail, so a throwing or malformed function yields no
/// slices and the first error is kept for the caller to collect.
pub(crate) struct JsGranularity {
    function: Function,
    error: RefCell<Option<TimelineError>>,
}

impl JsGranularity {
    pub(crate) fn new(function: Function) -> Self {
        Self {
            function,
            error: RefCell::new(None),
        }
    }

    pub(crate) fn from_js(value: JsValue) -> TimelineResult<Self> {
        value.dyn_into::<Function>().map(Self::new).map_err(|value| {
            TimelineError::InvalidConfig(format!("granularity must be a function, got {value:?}"))
        })
    }

    pub(crate) fn take_error(&self) -> Option<TimelineError> {
        self.error.borrow_mut().take()
    }

    fn call(&self, min: i64, max: i64) -> TimelineResult<Vec<TimeSlice>> {
        let returned = self
            .function
            .call2(
                &JsValue::NULL,
                &JsValue::from_f64(min as f64),
                &JsValue::from_f64(max as f64),
            )
            .map_err(|thrown| TimelineError::callback(&thrown))?;
        if !Array::is_array(&returned) {
            return Err(TimelineError::InvalidSlice(format!(
                "granularity must return an array, got {returned:?}"
            )));
        }
        Array::from(&returned)
            .iter()
            .map(|slice| slice_from_js(&slice))
            .collect()
    }
}

impl Granularity for JsGranularity {
    fn slices(&self, min: i64, max: i64) -> Box<dyn Iterator<Item = TimeSlice> + '_> {
        match self.call(min, max) {
            Ok(slices) => Box::new(slices.into_iter()),
            Err(err) => {
                self.error.borrow_mut().get_or_insert(err);
                Box::new(std::iter::empty())
            }
        }
    }
}
