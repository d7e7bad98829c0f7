//! Date parsing and display helpers shared by the models.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Medium human-readable date, e.g. "Jan 15, 2024". Empty when absent.
pub fn date_med(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// `yyyy-MM-dd`, the format `<input type="date">` expects. Empty when absent.
pub fn date_html(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Parse an ISO-8601 date or date-time, keeping only the calendar date.
///
/// Accepts `2024-01-15`, `2024-01-15T10:30`, `2024-01-15T10:30:00` and
/// RFC 3339 timestamps with an offset. Surrounding whitespace is rejected.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if s.trim() != s {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}
