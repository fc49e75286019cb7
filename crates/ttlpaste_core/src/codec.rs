//! Paste record encoding.
//!
//! Decoding is lenient per field: a payload that parses as a JSON object but
//! lost or mistyped some fields still yields a servable record with defaults
//! (empty content, zero counters, `created_at = now`). Only payloads that are
//! not a JSON object at all are rejected.

use crate::error::AppError;
use crate::models::paste::PasteRecord;
use crate::store::StoredValue;
use serde_json::{Map, Value};

/// Serialize a record to the string stored under its key.
///
/// # Errors
/// Returns [`AppError::MalformedRecord`] if serialization fails.
pub fn encode(record: &PasteRecord) -> Result<String, AppError> {
    serde_json::to_string(record).map_err(|err| AppError::MalformedRecord(err.to_string()))
}

/// Decode a stored value, defaulting missing or mistyped fields.
///
/// # Arguments
/// - `raw`: Value returned by the store, either raw text or structured JSON.
/// - `now_millis`: Substitute for a missing `created_at`.
///
/// # Errors
/// Returns [`AppError::MalformedRecord`] when the payload is not a JSON object.
pub fn decode(raw: &StoredValue, now_millis: i64) -> Result<PasteRecord, AppError> {
    match raw {
        StoredValue::Text(text) => {
            let parsed: Value = serde_json::from_str(text)
                .map_err(|err| AppError::MalformedRecord(err.to_string()))?;
            decode_value(&parsed, now_millis)
        }
        StoredValue::Structured(value) => decode_value(value, now_millis),
    }
}

fn decode_value(value: &Value, now_millis: i64) -> Result<PasteRecord, AppError> {
    let fields = value.as_object().ok_or_else(|| {
        AppError::MalformedRecord(format!("expected a JSON object, got {}", kind(value)))
    })?;
    Ok(PasteRecord {
        content: fields
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ttl_seconds: counter(fields, "ttl_seconds"),
        max_views: counter(fields, "max_views"),
        created_at: fields
            .get("created_at")
            .and_then(Value::as_i64)
            .unwrap_or(now_millis),
        views: counter(fields, "views"),
    })
}

fn counter(fields: &Map<String, Value>, name: &str) -> u64 {
    fields.get(name).and_then(Value::as_u64).unwrap_or(0)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
