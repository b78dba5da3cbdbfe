//! Visit-date search patterns and timestamp display helpers.
//!
//! `build_visit_date_pattern` turns optional year/month/day fragments into a
//! SQL LIKE pattern against the stored `YYYY-MM-DD` visit date. All functions
//! here are pure and do no I/O.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Trim and zero-pad a date fragment to `width` digits.
///
/// Returns an empty string when the fragment is empty or contains any
/// non-digit character. Fragments longer than `width` are kept as-is.
pub fn normalize_date_part(value: &str, width: usize) -> String {
    let text = value.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }
    format!("{text:0>width$}")
}

/// Build a LIKE pattern from optional date fragments.
///
/// Year pads to 4 digits, month and day to 2. An empty result means no date
/// filter should be applied.
pub fn build_visit_date_pattern(year: &str, month: &str, day: &str) -> String {
    let y = normalize_date_part(year, 4);
    let m = normalize_date_part(month, 2);
    let d = normalize_date_part(day, 2);

    if !y.is_empty() && !m.is_empty() && !d.is_empty() {
        format!("{y}-{m}-{d}")
    } else if !y.is_empty() && !m.is_empty() {
        format!("{y}-{m}-%")
    } else if !y.is_empty() {
        format!("{y}-%")
    } else if !m.is_empty() && !d.is_empty() {
        format!("%-{m}-{d}")
    } else if !m.is_empty() {
        format!("%-{m}-%")
    } else if !d.is_empty() {
        format!("%-%-{d}")
    } else {
        String::new()
    }
}

/// Parse an ISO-ish timestamp: `T` or space separator, optional seconds and
/// fractional part. A trailing UTC offset is accepted and dropped, keeping
/// the wall-clock time. A bare `YYYY-MM-DD` parses as midnight.
pub fn parse_flexible_datetime(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = chrono::DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_local());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Render a stored `created_at` for display: `YYYY-MM-DD H:MM AM/PM` with no
/// leading zero on the hour. Unparseable values fall back to the raw text
/// with the `T` separator replaced by a space.
pub fn format_saved_timestamp(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }
    match parse_flexible_datetime(value) {
        Some(dt) => {
            let (is_pm, hour) = dt.time().hour12();
            format!(
                "{} {}:{:02} {}",
                dt.date().format("%Y-%m-%d"),
                hour,
                dt.time().minute(),
                if is_pm { "PM" } else { "AM" }
            )
        }
        None => value.replace('T', " "),
    }
}
