//! Records as they arrive from the realtime and accessibility endpoints.
//!
//! Every field defaults when absent, `null` or of the wrong type, so one bad
//! value never costs the whole record. Display defaulting happens later in
//! `board` and `accessibility`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// An in-progress trip from a line feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Trip {
    /// Opaque identifier with the route and direction encoded in it.
    #[serde(default, deserialize_with = "lenient_string")]
    pub trip_id: String,
    /// Advisory only, never used for grouping.
    #[serde(default, deserialize_with = "lenient_text")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StopTimeUpdate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub stop_id: String,
    /// ISO-8601 timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub arrival_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub departure_time: Option<String>,
}

/// Elevator and escalator status for one station.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AccessibilityRecord {
    #[serde(default, deserialize_with = "lenient_list")]
    pub elevators: Vec<Equipment>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub escalators: Vec<Equipment>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub upcoming_outages: Vec<Outage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Equipment {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    /// Anything but a literal `true` counts as out of service.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_working: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub estimated_return: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Outage {
    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
}

/// `null` or a missing list is empty, as is a value that is not a list at
/// all; entries of the wrong shape are dropped individually instead of
/// failing the surrounding record.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            debug!(value = %other, "Expected a list, treating as empty");
            Vec::new()
        }
    };
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!(error = %e, "Dropping malformed list entry");
                None
            }
        })
        .collect())
}

/// Strings pass through and numbers are stringified; anything else is absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Null => None,
        other => {
            debug!(value = %other, "Ignoring non-text field");
            None
        }
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Only strings are timestamps. An epoch number or any other value is
/// treated as missing and later shows as not available.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Null => None,
        other => {
            debug!(value = %other, "Ignoring non-string timestamp");
            None
        }
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}
