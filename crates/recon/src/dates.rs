//! Date and duration normalization.
//!
//! Every timestamp that enters the pipeline becomes an [`Instant`]: a UTC
//! point in time that may also be *invalid*, the outcome of a best-effort
//! coercion that found nothing to parse. Invalid instants flow through the
//! transforms untouched and are reported by the validator, never raised.
//!
//! Formats are chrono strftime strings (`%Y-%m-%d`, `%d/%m/%Y`, …).

use chrono::{
    DateTime, Days, Duration, NaiveDate, NaiveDateTime, ParseError, SecondsFormat, TimeZone, Utc,
};
use serde::{Serialize, Serializer};

/// Formats tried, in order, after the caller's own format fails.
pub const FALLBACK_DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// Last-resort shapes for the generic coercion step.
const GENERIC_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Naive ISO-8601 shapes accepted when no offset is present.
const ISO_NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub const DISPLAY_FORMAT: &str = "%A, %Y-%m-%d";
pub const STANDARD_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Instant
// ---------------------------------------------------------------------------

/// A UTC timestamp, or the invalid marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(Option<DateTime<Utc>>);

impl Instant {
    pub const INVALID: Instant = Instant(None);

    pub fn from_utc(datetime: DateTime<Utc>) -> Self {
        Self(Some(datetime))
    }

    /// Naive wall-clock values are read as UTC.
    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Self(Some(Utc.from_utc_datetime(&datetime)))
    }

    /// Midnight at the start of `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        date.and_hms_opt(0, 0, 0)
            .map(Self::from_naive)
            .unwrap_or(Self::INVALID)
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

impl Serialize for Instant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match format_iso(*self) {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse `text` with `known_format`, then the fallback formats, then a
/// generic coercion. Never fails; check the result with [`is_valid`].
pub fn parse_strict(text: &str, known_format: &str) -> Instant {
    let text = text.trim();
    std::iter::once(known_format)
        .chain(FALLBACK_DATE_FORMATS)
        .find_map(|format| parse_with_format(text, format))
        .unwrap_or_else(|| coerce_generic(text))
}

fn parse_with_format(text: &str, format: &str) -> Option<Instant> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
        return Some(Instant::from_naive(datetime));
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .map(Instant::from_date)
}

fn coerce_generic(text: &str) -> Instant {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Instant::from_utc(datetime.with_timezone(&Utc));
    }
    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(Instant::from_naive)
        .unwrap_or(Instant::INVALID)
}

/// Strict ISO-8601 parse for API timestamps.
///
/// Accepts RFC 3339 (`Z` or `±hh:mm`), a compact `±hhmm` offset, a naive
/// date-time (read as UTC) and a bare date.
pub fn parse_iso8601(text: &str) -> Result<Instant, ParseError> {
    let text = text.trim();
    let rfc_err = match DateTime::parse_from_rfc3339(text) {
        Ok(datetime) => return Ok(Instant::from_utc(datetime.with_timezone(&Utc))),
        Err(e) => e,
    };

    if let Ok(datetime) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(Instant::from_utc(datetime.with_timezone(&Utc)));
    }

    if let Some(datetime) = ISO_NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Ok(Instant::from_naive(datetime));
    }

    match NaiveDate::parse_from_str(text, STANDARD_FORMAT) {
        Ok(date) => Ok(Instant::from_date(date)),
        Err(_) => Err(rfc_err),
    }
}

pub fn is_valid(instant: Instant) -> bool {
    instant.is_valid()
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Round to two decimal places. The epsilon nudge keeps `x.xx5` values from
/// rounding down through binary representation error.
fn round_two_places(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

pub fn seconds_to_decimal_hours(seconds: i64) -> f64 {
    round_two_places(seconds as f64 / 3600.0)
}

/// Whole seconds from `start` to `end` as rounded decimal hours.
///
/// End before start yields negative hours. An invalid instant yields `NaN`.
pub fn elapsed_decimal_hours(start: Instant, end: Instant) -> f64 {
    match (start.0, end.0) {
        (Some(start), Some(end)) => seconds_to_decimal_hours((end - start).num_seconds()),
        _ => f64::NAN,
    }
}

/// `HH:MM:SS` → rounded decimal hours.
///
/// Each component is read as a leading integer. A missing or non-numeric
/// component makes the whole result `NaN`.
pub fn duration_string_to_decimal_hours(text: &str) -> f64 {
    let mut parts = text.split(':');
    let mut component = || {
        parts
            .next()
            .and_then(parse_leading_int)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN)
    };
    let hours = component();
    let minutes = component();
    let seconds = component();

    let total_seconds = hours * 3600.0 + minutes * 60.0 + seconds;
    round_two_places(total_seconds / 3600.0)
}

/// Leading (optionally signed) integer of `text`, ignoring leading whitespace
/// and anything after the digits.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    rest[..digits_len].parse::<i64>().ok().map(|v| sign * v)
}

// ---------------------------------------------------------------------------
// Transforms + formatting
// ---------------------------------------------------------------------------

pub fn add_days(instant: Instant, days: i64) -> Instant {
    let Some(datetime) = instant.0 else {
        return Instant::INVALID;
    };
    let shifted = if days >= 0 {
        datetime.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        datetime.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    Instant(shifted)
}

/// Replace the time of day. Out-of-range components roll over into the
/// following day(s), so `set_time_of_day(d, 25, 0, 0)` is 01:00 the next day.
pub fn set_time_of_day(instant: Instant, hours: u32, minutes: u32, seconds: u32) -> Instant {
    let Some(datetime) = instant.0 else {
        return Instant::INVALID;
    };
    let offset = i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds);
    let midnight = Instant::from_date(datetime.date_naive());
    Instant(
        midnight
            .0
            .and_then(|m| m.checked_add_signed(Duration::seconds(offset))),
    )
}

/// `"Weekday, yyyy-MM-dd"`, e.g. `"Monday, 2024-03-04"`.
pub fn format_display(instant: Instant) -> Option<String> {
    instant.0.map(|d| d.format(DISPLAY_FORMAT).to_string())
}

/// `"yyyy-MM-dd"`.
pub fn format_standard(instant: Instant) -> Option<String> {
    instant.0.map(|d| d.format(STANDARD_FORMAT).to_string())
}

/// RFC 3339 with second precision, e.g. `"2024-03-04T09:30:00Z"`.
pub fn format_iso(instant: Instant) -> Option<String> {
    instant.0.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
}
