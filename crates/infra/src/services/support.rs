//! Helpers shared by the resource services

use chrono::{DateTime, NaiveDateTime};
use kinderhub_domain::constants::API_V1_PREFIX;
use kinderhub_domain::ApiEnvelope;
use serde_json::Value;

/// Prefix `path` with `/api/v1` unless the base URL already carries it.
#[must_use]
pub fn with_api_v1(base_url: &str, path: &str) -> String {
    if base_url.to_ascii_lowercase().contains(API_V1_PREFIX) {
        path.to_string()
    } else {
        format!("{API_V1_PREFIX}{path}")
    }
}

/// Payload of a `{status, message, data}` envelope, or the body itself.
///
/// A `null` or missing `data` falls back to the whole body.
#[must_use]
pub fn unwrap_data(body: Value) -> Value {
    match ApiEnvelope::detect(&body).and_then(|envelope| envelope.data) {
        Some(data) if !data.is_null() => data,
        _ => body,
    }
}

/// Array from `data` or a bare array; anything else is empty.
#[must_use]
pub fn unwrap_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Drop query parameters with empty values.
#[must_use]
pub fn clean_params<K, V>(pairs: impl IntoIterator<Item = (K, Option<V>)>) -> Vec<(String, String)>
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| {
            let value: String = value?.into();
            (!value.trim().is_empty()).then(|| (key.into(), value))
        })
        .collect()
}

/// Calendar date (`yyyy-MM-dd`) of an ISO date or date-time string.
///
/// Date-times keep the date as written, without shifting time zones. Plain
/// dates and unrecognised strings are returned unchanged.
#[must_use]
pub fn to_local_date_string(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if !value.contains('T') {
        return Some(value.to_string());
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive().format("%Y-%m-%d").to_string());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.date().format("%Y-%m-%d").to_string());
    }
    Some(value.chars().take(10).collect())
}
