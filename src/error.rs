//! Errors raised at the JavaScript boundary.
//!
//! Aggregation itself cannot fail; these cover decoding caller input and
//! calling back into caller-supplied functions.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Callback failed: {0}")]
    Callback(String),

    #[error("Invalid slice: {0}")]
    InvalidSlice(String),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(u32),

    #[error("Serialize error: {0}")]
    Serialization(String),
}

impl TimelineError {
    /// Wrap an exception thrown by a JS callback.
    pub fn callback(thrown: &JsValue) -> Self {
        let message = thrown
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(thrown, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|message| message.as_string())
            })
            .unwrap_or_else(|| format!("{thrown:?}"));
        TimelineError::Callback(message)
    }
}

impl From<serde_wasm_bindgen::Error> for TimelineError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        TimelineError::Serialization(err.to_string())
    }
}

impl From<TimelineError> for JsValue {
    fn from(err: TimelineError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Result alias used across the JS facade.
pub type TimelineResult<T> = Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            TimelineError::InvalidConfig("stepMs must be positive".into()).to_string(),
            "Invalid config: stepMs must be positive"
        );
        assert_eq!(TimelineError::UnknownBucket(9).to_string(), "Unknown bucket: 9");
    }
}
