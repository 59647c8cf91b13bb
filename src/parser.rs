//! Lenient decoding of JSON payloads into feed records.
//!
//! A payload whose top level has the wrong shape is rejected as a whole; a
//! single bad entry inside an otherwise valid list is skipped and logged.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::FetchError;
use crate::models::{AccessibilityRecord, Trip};

/// Decodes a line feed response (a JSON array of trips).
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the payload is not an array.
pub fn parse_trips(payload: Value) -> Result<Vec<Trip>, FetchError> {
    match payload {
        Value::Array(items) => Ok(decode_each(items, "trip")),
        other => Err(FetchError::Malformed(format!(
            "expected an array of trips, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decodes a station accessibility response (a JSON object).
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the payload is not an object.
pub fn parse_accessibility(payload: Value) -> Result<AccessibilityRecord, FetchError> {
    if !payload.is_object() {
        return Err(FetchError::Malformed(format!(
            "expected an accessibility object, got {}",
            kind_of(&payload)
        )));
    }
    Ok(serde_json::from_value(payload)?)
}

fn decode_each<T: DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, kind = what, "Skipping malformed record");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!(total, kept = decoded.len(), kind = what, "Some records were skipped");
    }
    decoded
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
