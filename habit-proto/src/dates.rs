//! Calendar-day helpers.
//!
//! Every date here is a local-timezone calendar day. There is no timezone
//! normalization: callers treat all dates as local, midnight-anchored.

use chrono::{Local, NaiveDate};

/// Wire and form-input format for dates (`YYYY-MM-DD`).
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default human-readable display format, e.g. `Jan 5, 2026`.
pub const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

/// A string that could not be read as a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date {input:?}: expected YYYY-MM-DD")]
pub struct DateParseError {
    /// The rejected input.
    pub input: String,
}

/// Parses an ISO date.
///
/// Full timestamps (`2026-03-01T08:30:00`) are accepted and truncated to
/// their day part.
///
/// # Errors
///
/// Returns [`DateParseError`] if the day part is not a valid `YYYY-MM-DD`.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let day = input.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(day, ISO_DATE_FORMAT).map_err(|_| DateParseError {
        input: input.to_string(),
    })
}

/// Formats a date the way form inputs and query strings expect it.
#[must_use]
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Formats a date for display using [`DISPLAY_DATE_FORMAT`].
#[must_use]
pub fn format_display_date(date: NaiveDate) -> String {
    format_date_with(date, DISPLAY_DATE_FORMAT)
}

/// Formats a date with an arbitrary chrono format string.
#[must_use]
pub fn format_date_with(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

/// Today's date in the local timezone.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whether two dates fall on the same calendar day.
#[must_use]
pub fn is_same_day(a: NaiveDate, b: NaiveDate) -> bool {
    a == b
}

/// Whether `date` is today.
#[must_use]
pub fn is_today(date: NaiveDate) -> bool {
    is_same_day(date, today())
}

/// Whether `date` is strictly before `reference`.
#[must_use]
pub fn is_before(date: NaiveDate, reference: NaiveDate) -> bool {
    date < reference
}

/// Whether `date` is strictly before today.
#[must_use]
pub fn is_before_today(date: NaiveDate) -> bool {
    is_before(date, today())
}

/// Inclusive range check: `start <= date <= end`.
#[must_use]
pub fn is_in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

/// Absolute number of days between two dates.
///
/// Whole calendar days are already integral, so the ceiling of the
/// difference is the difference itself.
#[must_use]
pub fn days_between(a: NaiveDate, b: NaiveDate) -> u64 {
    (b - a).num_days().unsigned_abs()
}
