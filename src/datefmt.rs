//! Display formatting for backend datetimes.
//!
//! The backend sends local datetimes as `yyyy-MM-ddTHH:mm:ss`. Views show
//! `October 19, 2026`, `09:30 AM`, or both joined with `at`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Placeholder for a missing value.
pub const MISSING: &str = "N/A";

/// Placeholder for a value that could not be parsed.
pub const INVALID: &str = "Invalid Date";

const DATE_FORMAT: &str = "%B %-d, %Y";
const TIME_FORMAT: &str = "%I:%M %p";

/// Parse the datetime shapes the backend and the booking form produce.
///
/// Accepts `2026-10-19T09:30:00`, `2026-10-19T09:30`, fractional seconds,
/// RFC 3339 with an offset (kept in that offset's local time) and a bare
/// date (midnight).
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn format_with(value: &str, render: impl Fn(&NaiveDateTime) -> String) -> String {
    if value.trim().is_empty() {
        return MISSING.to_string();
    }
    match parse_datetime(value) {
        Some(dt) => render(&dt),
        None => {
            debug!("Unparsable datetime for display: {:?}", value);
            INVALID.to_string()
        }
    }
}

/// `2026-10-19T09:30:00` → `October 19, 2026`.
pub fn format_date(value: &str) -> String {
    format_with(value, |dt| dt.format(DATE_FORMAT).to_string())
}

/// `2026-10-19T09:30:00` → `09:30 AM`.
pub fn format_time(value: &str) -> String {
    format_with(value, |dt| dt.format(TIME_FORMAT).to_string())
}

/// `2026-10-19T09:30:00` → `October 19, 2026 at 09:30 AM`.
pub fn format_date_time(value: &str) -> String {
    format_with(value, format_naive)
}

/// Same rendering as [`format_date_time`] for an already-parsed value.
pub fn format_naive(dt: &NaiveDateTime) -> String {
    format!("{} at {}", dt.format(DATE_FORMAT), dt.format(TIME_FORMAT))
}
