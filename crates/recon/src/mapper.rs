//! Per-source mapping into [`CanonicalRecord`].
//!
//! CSV exports are first lifted from an untyped [`CsvRow`] into a typed,
//! all-optional row struct for their tracker. Header spellings are an
//! external contract and must match the exports byte for byte.

use std::fmt;
use std::str::FromStr;

use crate::dates::{self, Instant};
use crate::error::PipelineError;
use crate::model::{CanonicalRecord, CsvRow, RawApiRecord};
use crate::ticket;
use crate::validate;

/// Date format of Toggl "Detailed report" CSV exports.
pub const TOGGL_DATE_FORMAT: &str = "%Y-%m-%d";
/// Date format of Clockify "Detailed report" CSV exports.
pub const CLOCKIFY_DATE_FORMAT: &str = "%d/%m/%Y";

// ---------------------------------------------------------------------------
// Source selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsvSource {
    Toggl,
    Clockify,
}

impl CsvSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toggl => "toggl",
            Self::Clockify => "clockify",
        }
    }

    /// Map one raw row with this source's header layout.
    pub fn map_row(&self, row: &CsvRow) -> CanonicalRecord {
        match self {
            Self::Toggl => map_toggl_row(&TogglCsvRow::from_row(row)),
            Self::Clockify => map_clockify_row(&ClockifyCsvRow::from_row(row)),
        }
    }
}

impl FromStr for CsvSource {
    type Err = PipelineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "toggl" => Ok(Self::Toggl),
            "clockify" => Ok(Self::Clockify),
            other => Err(PipelineError::UnsupportedSource(other.to_string())),
        }
    }
}

impl fmt::Display for CsvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Typed CSV rows
// ---------------------------------------------------------------------------

fn cell(row: &CsvRow, header: &str) -> Option<String> {
    row.get(header).cloned()
}

/// A Toggl CSV row. `None` means the column is not in the export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TogglCsvRow {
    pub project: Option<String>,
    pub billable: Option<String>,
    pub description: Option<String>,
    pub task: Option<String>,
    pub tags: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// `HH:MM:SS` or decimal hours, depending on export settings.
    pub duration: Option<String>,
}

impl TogglCsvRow {
    pub fn from_row(row: &CsvRow) -> Self {
        Self {
            project: cell(row, "Project"),
            billable: cell(row, "Billable"),
            description: cell(row, "Description"),
            task: cell(row, "Task"),
            tags: cell(row, "Tags"),
            start_date: cell(row, "Start date"),
            end_date: cell(row, "End date"),
            start_time: cell(row, "Start time"),
            end_time: cell(row, "End time"),
            duration: cell(row, "Duration"),
        }
    }
}

/// A Clockify CSV row. `None` means the column is not in the export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockifyCsvRow {
    pub project: Option<String>,
    pub billable: Option<String>,
    pub description: Option<String>,
    pub task: Option<String>,
    pub tags: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Display form, e.g. `"01:30:00"`.
    pub duration_hours: Option<String>,
    /// Decimal form, e.g. `"1.50"`.
    pub duration_decimal: Option<String>,
}

impl ClockifyCsvRow {
    pub fn from_row(row: &CsvRow) -> Self {
        Self {
            project: cell(row, "Project"),
            billable: cell(row, "Billable"),
            description: cell(row, "Description"),
            task: cell(row, "Task"),
            tags: cell(row, "Tags"),
            start_date: cell(row, "Start Date"),
            end_date: cell(row, "End Date"),
            start_time: cell(row, "Start Time"),
            end_time: cell(row, "End Time"),
            duration_hours: cell(row, "Duration (h)"),
            duration_decimal: cell(row, "Duration (decimal)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Only the literal `"Yes"` is billable.
fn parse_billable(value: Option<&str>) -> bool {
    value == Some("Yes")
}

/// Blank date text leaves the field unset; anything else is coerced.
fn parse_date_cell(value: Option<&str>, format: &str) -> Option<Instant> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| dates::parse_strict(v, format))
}

/// Decimal hours read from the longest numeric prefix (`"1.5h"` is 1.5,
/// `"1,5"` is 1). `NaN` when the text does not start with a number; words
/// such as `inf` or `nan` are not numbers here.
fn parse_decimal_hours(value: &str) -> f64 {
    let text = value.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = leading_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = leading_digits(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when digits follow it.
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = leading_digits(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

fn leading_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Ticket resolution and validation, shared by every mapper.
fn finish(mut record: CanonicalRecord) -> CanonicalRecord {
    record.target_process_number = ticket::resolve_for_record(&record);
    record.errors = validate::validate(&record);
    log::trace!(
        "mapped record: ticket {:?}, {} defect(s)",
        record.target_process_number,
        record.errors.len()
    );
    record
}

// ---------------------------------------------------------------------------
// Mappers
// ---------------------------------------------------------------------------

/// Map an API-sourced entry.
///
/// Timestamps are expected to be well-formed; one that is not is a
/// structural error and aborts the batch it belongs to.
pub fn map_api_record(raw: &RawApiRecord) -> Result<CanonicalRecord, PipelineError> {
    let mut record = CanonicalRecord {
        billable: raw.billable,
        project: raw.project.clone(),
        description: raw.description.clone(),
        tags: raw.tags.clone(),
        ..Default::default()
    };

    record.start_date = parse_api_timestamp("start", raw.start.as_deref())?;
    record.end_date = parse_api_timestamp("end", raw.end.as_deref())?;

    if let (Some(start), Some(end)) = (record.start_date, record.end_date) {
        record.duration_decimal = Some(dates::elapsed_decimal_hours(start, end));
    }

    Ok(finish(record))
}

fn parse_api_timestamp(field: &str, value: Option<&str>) -> Result<Option<Instant>, PipelineError> {
    match value.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(text) => dates::parse_iso8601(text)
            .map(Some)
            .map_err(|_| PipelineError::TimestampParse {
                field: field.to_string(),
                value: text.to_string(),
            }),
    }
}

pub fn map_toggl_row(row: &TogglCsvRow) -> CanonicalRecord {
    let mut record = CanonicalRecord {
        project: row.project.clone(),
        billable: parse_billable(row.billable.as_deref()),
        description: row.description.clone(),
        task: row.task.clone(),
        tags: row.tags.clone(),
        start_date: parse_date_cell(row.start_date.as_deref(), TOGGL_DATE_FORMAT),
        end_date: parse_date_cell(row.end_date.as_deref(), TOGGL_DATE_FORMAT),
        start_time: row.start_time.clone(),
        end_time: row.end_time.clone(),
        ..Default::default()
    };

    if let Some(duration) = row.duration.as_deref().filter(|d| !d.is_empty()) {
        if duration.contains(':') {
            record.duration_decimal = Some(dates::duration_string_to_decimal_hours(duration));
            record.duration_hours = Some(duration.to_string());
        } else {
            record.duration_decimal = Some(parse_decimal_hours(duration));
        }
    }

    finish(record)
}

pub fn map_clockify_row(row: &ClockifyCsvRow) -> CanonicalRecord {
    let mut record = CanonicalRecord {
        project: row.project.clone(),
        billable: parse_billable(row.billable.as_deref()),
        description: row.description.clone(),
        task: row.task.clone(),
        tags: row.tags.clone(),
        start_date: parse_date_cell(row.start_date.as_deref(), CLOCKIFY_DATE_FORMAT),
        end_date: parse_date_cell(row.end_date.as_deref(), CLOCKIFY_DATE_FORMAT),
        start_time: row.start_time.clone(),
        end_time: row.end_time.clone(),
        duration_hours: row.duration_hours.clone(),
        ..Default::default()
    };

    if let Some(decimal) = row.duration_decimal.as_deref().filter(|d| !d.is_empty()) {
        record.duration_decimal = Some(parse_decimal_hours(decimal));
    }

    finish(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{format_iso, format_standard};

    fn row(cells: &[(&str, &str)]) -> CsvRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn api(start: Option<&str>, end: Option<&str>) -> RawApiRecord {
        RawApiRecord {
            id: "1".into(),
            description: Some("Implement login TP2001".into()),
            project: Some("Portal".into()),
            billable: true,
            tags: Some("dev, backend".into()),
            start: start.map(Into::into),
            end: end.map(Into::into),
        }
    }

    // -- API ---------------------------------------------------------------

    #[test]
    fn api_record_full() {
        let raw = api(Some("2024-03-04T09:00:00Z"), Some("2024-03-04T10:30:00Z"));
        let record = map_api_record(&raw).unwrap();

        assert!(record.billable);
        assert_eq!(record.project.as_deref(), Some("Portal"));
        assert_eq!(record.tags.as_deref(), Some("dev, backend"));
        assert_eq!(record.duration_decimal, Some(1.5));
        assert_eq!(record.target_process_number, Some(2001));
        assert!(record.errors.is_empty());
        assert_eq!(
            record.start_date.and_then(format_iso).as_deref(),
            Some("2024-03-04T09:00:00Z")
        );
    }

    #[test]
    fn api_record_running_entry_has_no_duration() {
        let record = map_api_record(&api(Some("2024-03-04T09:00:00Z"), None)).unwrap();
        assert!(record.end_date.is_none());
        assert!(record.duration_decimal.is_none());
        assert_eq!(record.errors, vec!["No decimal hours"]);
    }

    #[test]
    fn api_record_blank_timestamps_are_absent() {
        let record = map_api_record(&api(Some("  "), Some(""))).unwrap();
        assert!(record.start_date.is_none());
        assert!(record.end_date.is_none());
        assert_eq!(record.errors, vec!["Invalid start date", "No decimal hours"]);
    }

    #[test]
    fn api_record_malformed_timestamp_is_an_error() {
        let err = map_api_record(&api(Some("2024-03-04T09:00:00Z"), Some("soon"))).unwrap_err();
        assert_eq!(
            err,
            PipelineError::TimestampParse {
                field: "end".into(),
                value: "soon".into()
            }
        );
    }

    #[test]
    fn api_record_ticket_from_project_when_text_has_none() {
        let raw = RawApiRecord {
            description: Some("standup".into()),
            tags: None,
            project: Some("Maintenance #314".into()),
            ..api(Some("2024-03-04T09:00:00Z"), Some("2024-03-04T09:15:00Z"))
        };
        let record = map_api_record(&raw).unwrap();
        assert_eq!(record.target_process_number, Some(314));
        assert_eq!(record.duration_decimal, Some(0.25));
    }

    #[test]
    fn api_record_end_before_start_is_kept_negative() {
        let record =
            map_api_record(&api(Some("2024-03-04T10:00:00Z"), Some("2024-03-04T09:00:00Z"))).unwrap();
        assert_eq!(record.duration_decimal, Some(-1.0));
        assert_eq!(record.errors, vec!["No decimal hours"]);
    }

    // -- Toggl -------------------------------------------------------------

    #[test]
    fn toggl_row_hms_duration() {
        let record = CsvSource::Toggl.map_row(&row(&[
            ("Project", "Portal"),
            ("Billable", "Yes"),
            ("Description", "Review PR #77"),
            ("Task", "Code review"),
            ("Tags", "review"),
            ("Start date", "2024-03-04"),
            ("End date", "2024-03-04"),
            ("Start time", "09:00:00"),
            ("End time", "10:15:00"),
            ("Duration", "01:15:00"),
        ]));

        assert!(record.billable);
        assert_eq!(record.task.as_deref(), Some("Code review"));
        assert_eq!(record.duration_decimal, Some(1.25));
        assert_eq!(record.duration_hours.as_deref(), Some("01:15:00"));
        assert_eq!(record.start_time.as_deref(), Some("09:00:00"));
        assert_eq!(record.end_time.as_deref(), Some("10:15:00"));
        assert_eq!(record.target_process_number, Some(77));
        assert_eq!(record.start_date.and_then(format_standard).as_deref(), Some("2024-03-04"));
        assert!(record.errors.is_empty());
    }

    #[test]
    fn toggl_row_decimal_duration() {
        let record = CsvSource::Toggl.map_row(&row(&[
            ("Description", "TP5 docs"),
            ("Start date", "2024-03-04"),
            ("Duration", "2.75"),
        ]));
        assert_eq!(record.duration_decimal, Some(2.75));
        assert!(record.duration_hours.is_none());
        assert!(record.errors.is_empty());
    }

    #[test]
    fn toggl_row_unreadable_duration_is_flagged() {
        let record = CsvSource::Toggl.map_row(&row(&[
            ("Description", "TP5 docs"),
            ("Start date", "2024-03-04"),
            ("Duration", "two hours"),
        ]));
        assert!(record.duration_decimal.is_some_and(f64::is_nan));
        assert_eq!(record.errors, vec!["No decimal hours"]);
    }

    #[test]
    fn decimal_hours_read_the_numeric_prefix() {
        assert_eq!(parse_decimal_hours("1.5"), 1.5);
        assert_eq!(parse_decimal_hours(" 1.5h"), 1.5);
        assert_eq!(parse_decimal_hours("1,5"), 1.0);
        assert_eq!(parse_decimal_hours(".5"), 0.5);
        assert_eq!(parse_decimal_hours("-2"), -2.0);
        assert_eq!(parse_decimal_hours("2.5e1 hours"), 25.0);
        assert_eq!(parse_decimal_hours("3e"), 3.0);
        assert_eq!(parse_decimal_hours("4.e+x"), 4.0);
    }

    #[test]
    fn decimal_hours_reject_words() {
        for text in ["inf", "infinity", "-inf", "NaN", "", ".", "-", "e5", "h1.5"] {
            assert!(parse_decimal_hours(text).is_nan(), "text = {text:?}");
        }
    }

    #[test]
    fn toggl_row_decimal_duration_with_suffix() {
        let record = CsvSource::Toggl.map_row(&row(&[
            ("Description", "TP5 docs"),
            ("Start date", "2024-03-04"),
            ("Duration", "1.5h"),
        ]));
        assert_eq!(record.duration_decimal, Some(1.5));
        assert!(record.errors.is_empty(), "errors: {:?}", record.errors);
    }

    #[test]
    fn clockify_row_infinite_decimal_is_flagged() {
        for decimal in ["inf", "1e999"] {
            let record = CsvSource::Clockify.map_row(&row(&[
                ("Description", "TP5 docs"),
                ("Start Date", "03/04/2024"),
                ("Duration (decimal)", decimal),
            ]));
            assert_eq!(record.errors, vec!["No decimal hours"], "decimal = {decimal}");
        }
    }

    #[test]
    fn toggl_row_empty_duration_is_absent() {
        let record = CsvSource::Toggl.map_row(&row(&[("Duration", "")]));
        assert!(record.duration_decimal.is_none());
    }

    #[test]
    fn billable_values() {
        let missing = CsvSource::Toggl.map_row(&row(&[]));
        let yes = CsvSource::Toggl.map_row(&row(&[("Billable", "Yes")]));
        let no = CsvSource::Toggl.map_row(&row(&[("Billable", "No")]));
        let lower = CsvSource::Clockify.map_row(&row(&[("Billable", "yes")]));
        assert!(!missing.billable);
        assert!(yes.billable);
        assert!(!no.billable);
        assert!(!lower.billable);
    }

    #[test]
    fn toggl_ignores_clockify_headers() {
        let record = CsvSource::Toggl.map_row(&row(&[
            ("Start Date", "2024-03-04"),
            ("Duration (decimal)", "1.00"),
        ]));
        assert!(record.start_date.is_none());
        assert!(record.duration_decimal.is_none());
    }

    #[test]
    fn toggl_unparseable_date_is_invalid_not_missing() {
        let record = CsvSource::Toggl.map_row(&row(&[("Start date", "someday")]));
        assert_eq!(record.start_date, Some(Instant::INVALID));
        assert_eq!(record.errors[0], "Invalid start date");
    }

    // -- Clockify ----------------------------------------------------------

    #[test]
    fn clockify_row() {
        let record = CsvSource::Clockify.map_row(&row(&[
            ("Project", "Portal TP900"),
            ("Billable", "No"),
            ("Description", "Deploy"),
            ("Tags", "ops"),
            ("Start Date", "04/03/2024"),
            ("End Date", "05/03/2024"),
            ("Start Time", "23:00:00"),
            ("End Time", "01:00:00"),
            ("Duration (h)", "02:00:00"),
            ("Duration (decimal)", "2.00"),
        ]));

        assert!(!record.billable);
        assert_eq!(record.start_date.and_then(format_standard).as_deref(), Some("2024-03-04"));
        assert_eq!(record.end_date.and_then(format_standard).as_deref(), Some("2024-03-05"));
        assert_eq!(record.duration_hours.as_deref(), Some("02:00:00"));
        assert_eq!(record.duration_decimal, Some(2.0));
        assert_eq!(record.target_process_number, Some(900));
        assert!(record.errors.is_empty());
    }

    #[test]
    fn clockify_iso_dates_use_fallback() {
        let record = CsvSource::Clockify.map_row(&row(&[("Start Date", "2024-03-04")]));
        assert_eq!(record.start_date.and_then(format_standard).as_deref(), Some("2024-03-04"));
    }

    #[test]
    fn clockify_display_duration_alone_leaves_decimal_unset() {
        let record = CsvSource::Clockify.map_row(&row(&[("Duration (h)", "01:00:00")]));
        assert_eq!(record.duration_hours.as_deref(), Some("01:00:00"));
        assert!(record.duration_decimal.is_none());
    }

    #[test]
    fn source_tags() {
        assert_eq!("toggl".parse::<CsvSource>().unwrap(), CsvSource::Toggl);
        assert_eq!("clockify".parse::<CsvSource>().unwrap(), CsvSource::Clockify);
        assert_eq!(
            "Toggl".parse::<CsvSource>().unwrap_err(),
            PipelineError::UnsupportedSource("Toggl".into())
        );
    }
}
