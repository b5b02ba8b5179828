//! Backend response envelope
//!
//! Most endpoints wrap their payload as `{status, message, data}`. Some
//! return the bare payload, so every field is optional here and callers fall
//! back to the raw body when `data` is absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{status, message, data}` wrapper used by the REST backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    /// Status code echoed in the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    /// Human-readable outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiEnvelope<Value> {
    /// Read an envelope out of a JSON body.
    ///
    /// Returns `None` unless the body is an object carrying a `data` key,
    /// mirroring the `'data' in body` check the backend contract relies on.
    #[must_use]
    pub fn detect(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        if !object.contains_key("data") {
            return None;
        }
        Some(Self {
            status: object.get("status").and_then(Value::as_i64),
            message: object.get("message").and_then(Value::as_str).map(String::from),
            data: object.get("data").cloned(),
        })
    }
}
