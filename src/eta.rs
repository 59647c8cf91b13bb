//! Countdown labels for predicted arrivals.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

const MILLIS_PER_MINUTE: i64 = 60_000;

pub const NOT_AVAILABLE: &str = "N/A";

/// Time remaining until a stop event, in whole minutes rounded down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// No timestamp, or one that could not be parsed.
    NotAvailable,
    Departed,
    ArrivingNow,
    Minutes(i64),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::NotAvailable => f.write_str(NOT_AVAILABLE),
            Eta::Departed => f.write_str("Departed"),
            Eta::ArrivingNow => f.write_str("Arriving now"),
            Eta::Minutes(n) => write!(f, "{n} min"),
        }
    }
}

impl Serialize for Eta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses an RFC 3339 timestamp. Timestamps without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Countdown from `now` to `arrival`.
pub fn time_until(arrival: Option<&str>, now: DateTime<Utc>) -> Eta {
    let Some(arrival) = arrival.and_then(parse_timestamp) else {
        return Eta::NotAvailable;
    };
    let minutes = (arrival - now)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_MINUTE);
    match minutes {
        m if m < 0 => Eta::Departed,
        0 => Eta::ArrivingNow,
        m => Eta::Minutes(m),
    }
}

/// Arrival as `HH:MM` on the wall clock of `tz`, or `N/A`.
pub fn arrival_clock(arrival: Option<&str>, tz: Tz) -> String {
    arrival
        .and_then(parse_timestamp)
        .map(|ts| ts.with_timezone(&tz).format("%H:%M").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
