use std::collections::HashMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::dates::Instant;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A time entry fetched from a tracker API and already flattened: project id
/// resolved to a name, tag ids resolved and joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawApiRecord {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub tags: Option<String>,
    /// ISO-8601 text.
    #[serde(default)]
    pub start: Option<String>,
    /// ISO-8601 text, absent while the entry is still running.
    #[serde(default)]
    pub end: Option<String>,
}

/// One tokenized CSV row: header text → cell text. Columns vary by export.
pub type CsvRow = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Canonical record
// ---------------------------------------------------------------------------

/// The tracker-agnostic time entry produced by every mapper.
///
/// Serialized with the camelCase keys the submission UI consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Comma-joined tag names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Instant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Instant>,
    /// Decimal hours. May be `NaN` when the source text was unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_decimal: Option<f64>,
    /// Duration as the source displayed it, e.g. `"01:30:00"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_process_number: Option<u64>,
    /// Reserved for merged entries; no mapper sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_in_aggregate: Option<u32>,
    /// Validation defects. Empty when the record is ready to submit.
    pub errors: Vec<String>,
    /// Set by the submitter after posting, never by the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_success: Option<bool>,
    pub billable: bool,
}

impl CanonicalRecord {
    pub fn has_defects(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Batch outcome
// ---------------------------------------------------------------------------

/// All-or-nothing outcome of one batch call.
///
/// A failure carries no records at all: callers never see a half-mapped batch.
/// Serializes as `{"success": bool, "data": [...] | null, "errorMessage": str | null}`.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult {
    Success(Vec<CanonicalRecord>),
    Failure(PipelineError),
}

impl BatchResult {
    pub fn success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn data(&self) -> Option<&[CanonicalRecord]> {
        match self {
            Self::Success(records) => Some(records),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }

    pub fn into_result(self) -> Result<Vec<CanonicalRecord>, PipelineError> {
        match self {
            Self::Success(records) => Ok(records),
            Self::Failure(err) => Err(err),
        }
    }
}

impl From<Result<Vec<CanonicalRecord>, PipelineError>> for BatchResult {
    fn from(result: Result<Vec<CanonicalRecord>, PipelineError>) -> Self {
        match result {
            Ok(records) => Self::Success(records),
            Err(err) => Self::Failure(err),
        }
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchResult", 3)?;
        state.serialize_field("success", &self.success())?;
        state.serialize_field("data", &self.data())?;
        state.serialize_field("errorMessage", &self.error_message())?;
        state.end()
    }
}
