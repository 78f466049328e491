//! Time and date parsing utilities.
//!
//! Two ingestion conventions live here:
//! - tracker timestamps keep the wall-clock time the tracker reported and
//!   drop the offset (`naive_local`)
//! - code-host timestamps are normalised to UTC (`naive_utc`)

use crate::error::{ReportError, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

fn parse_with_offset(s: &str) -> Option<DateTime<chrono::FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(s, format).ok())
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parse a tracker timestamp such as `2025-01-05T10:00:00.000-0500`.
///
/// The reported wall-clock time is kept and the offset dropped.
#[must_use]
pub fn parse_tracker_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    parse_with_offset(s)
        .map(|dt| dt.naive_local())
        .or_else(|| parse_naive(s))
}

/// Parse a code-host timestamp such as `2025-01-02T15:04:05Z`, as UTC.
#[must_use]
pub fn parse_record_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    parse_with_offset(s)
        .map(|dt| dt.naive_utc())
        .or_else(|| parse_naive(s))
}

/// Parse a date argument.
///
/// Supports:
/// - Simple date: `2025-01-15`
/// - Keywords: `today`, `yesterday`
/// - Relative days: `-30d`, `-2w`
///
/// # Errors
///
/// Returns a validation error naming `field_name` when the input matches
/// none of the supported forms or a relative offset leaves the calendar.
pub fn parse_date_arg(s: &str, field_name: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let today = Local::now().date_naive();
    match s.to_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix('-') {
        if let Some(unit_char) = rest.chars().last() {
            let amount_str = &rest[..rest.len() - unit_char.len_utf8()];
            if let Ok(amount) = amount_str.parse::<i64>() {
                let duration = match unit_char {
                    'd' => Duration::try_days(amount),
                    'w' => Duration::try_weeks(amount),
                    _ => {
                        return Err(ReportError::validation(
                            field_name,
                            "invalid unit (use d, w)",
                        ));
                    }
                };
                return duration
                    .and_then(|duration| today.checked_sub_signed(duration))
                    .ok_or_else(|| ReportError::validation(field_name, "date out of range"));
            }
        }
    }

    Err(ReportError::validation(
        field_name,
        "invalid date (try: 2025-01-15, today, yesterday, -30d, -2w)",
    ))
}

/// Start of the calendar week containing `date`, weeks starting on Sunday.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Every date in the closed range `[start, end]`; empty when `start > end`.
#[must_use]
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}
