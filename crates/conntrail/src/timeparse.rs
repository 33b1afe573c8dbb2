//! Timestamp parsing shared by the reconstruction and task paths.
//!
//! Parsing never fails hard: an unparseable value is `None` and callers
//! treat the event or interval as unusable for interval arithmetic.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Substituted when a log carries no date column, so time-only logs
/// still produce comparable timestamps.
pub const DEFAULT_DATE: &str = "01/01/1970";

/// Date layouts tried in order. `D/M/Y` is preferred over `M/D/Y` for
/// slash-separated dates; unambiguous values resolve on whichever side
/// is valid.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
];

/// ISO-8601-ish layouts for the task-shaped input side.
const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a log event timestamp from separate date and time cells.
///
/// The time separators `.` and `-` are normalized to `:` before the
/// format list is tried; an empty date falls back to [`DEFAULT_DATE`].
/// As a last resort the raw time cell is interpreted as a Unix epoch
/// number.
pub fn parse_event_timestamp(date_str: &str, time_str: &str) -> Option<NaiveDateTime> {
    let time = time_str.trim();
    if time.is_empty() {
        return None;
    }
    let date = date_str.trim();
    let date = if date.is_empty() { DEFAULT_DATE } else { date };

    let normalized = time.replace(['.', '-'], ":");
    let candidate = format!("{date} {normalized}");
    for date_format in DATE_FORMATS {
        if let Ok(dt) =
            NaiveDateTime::parse_from_str(&candidate, &format!("{date_format} %H:%M:%S"))
        {
            return Some(dt);
        }
        if let Ok(dt) =
            NaiveDateTime::parse_from_str(&candidate, &format!("{date_format} %H:%M:%S%.f"))
        {
            return Some(dt);
        }
    }

    parse_epoch(time)
}

/// Parse a standalone timestamp: Unix epoch number first, then the ISO
/// layouts, then a bare `YYYY-MM-DD` date at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(dt) = parse_epoch(value) {
        return Some(dt);
    }
    for format in ISO_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.naive_utc())
}
