//! Parsing of already-read input text into engine inputs.
//!
//! Callers own file access and hand over the contents.

use serde::de::DeserializeOwned;

use crate::error::PipelineError;
use crate::model::{CsvRow, RawApiRecord};
use crate::source::{self, ClockifyProject, ClockifyTag, ClockifyTimeEntry, TogglProject, TogglTimeEntry};

/// Tokenize a tracker CSV export into header-keyed rows.
///
/// Short rows are accepted; their missing trailing columns are simply
/// absent from the row map.
pub fn load_csv_rows(csv_data: &str) -> Result<Vec<CsvRow>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::InputParse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| PipelineError::InputParse(e.to_string()))?;
        let row: CsvRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    log::debug!("loaded {} csv rows with {} columns", rows.len(), headers.len());
    Ok(rows)
}

fn parse_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, PipelineError> {
    serde_json::from_str(json).map_err(|e| PipelineError::InputParse(format!("{what}: {e}")))
}

/// A JSON array of already-flattened API records.
pub fn load_raw_records(json: &str) -> Result<Vec<RawApiRecord>, PipelineError> {
    parse_json("raw records", json)
}

/// Toggl time entries and projects dumps, flattened.
pub fn load_toggl_dump(entries_json: &str, projects_json: &str) -> Result<Vec<RawApiRecord>, PipelineError> {
    let entries: Vec<TogglTimeEntry> = parse_json("toggl entries", entries_json)?;
    let projects: Vec<TogglProject> = parse_json("toggl projects", projects_json)?;
    Ok(source::flatten_toggl_entries(&entries, &projects))
}

/// Clockify time entries, projects and (optional) tags dumps, flattened.
pub fn load_clockify_dump(
    entries_json: &str,
    projects_json: &str,
    tags_json: Option<&str>,
) -> Result<Vec<RawApiRecord>, PipelineError> {
    let entries: Vec<ClockifyTimeEntry> = parse_json("clockify entries", entries_json)?;
    let projects: Vec<ClockifyProject> = parse_json("clockify projects", projects_json)?;
    let tags: Vec<ClockifyTag> = match tags_json {
        Some(json) => parse_json("clockify tags", json)?,
        None => Vec::new(),
    };
    Ok(source::flatten_clockify_entries(&entries, &projects, &tags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_keyed_by_header() {
        let rows = load_csv_rows(
            "Project,Description,Duration\n\
             Portal,\"Fix login, TP12\",01:00:00\n\
             ,standup\n",
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Description"], "Fix login, TP12");
        assert_eq!(rows[0]["Duration"], "01:00:00");
        assert_eq!(rows[1]["Project"], "");
        assert!(!rows[1].contains_key("Duration"));
    }

    #[test]
    fn csv_headers_only() {
        assert!(load_csv_rows("Project,Description\n").unwrap().is_empty());
    }

    #[test]
    fn raw_records_reject_non_array() {
        let err = load_raw_records(r#"{"id": "1"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::InputParse(_)));
        assert!(err.to_string().starts_with("input parse error: raw records:"));
    }

    #[test]
    fn clockify_dump_without_tags() {
        let raw = load_clockify_dump(
            r#"[{"id": "e1", "tagIds": ["t1"], "timeInterval": {"start": "2024-03-04T09:00:00Z"}}]"#,
            "[]",
            None,
        )
        .unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw[0].tags.is_none());
        assert!(raw[0].end.is_none());
    }

    #[test]
    fn toggl_dump() {
        let raw = load_toggl_dump(
            r#"[{"id": 5, "project_id": 1, "start": "2024-03-04T09:00:00Z", "tags": ["a"]}]"#,
            r#"[{"id": 1, "name": "Portal"}]"#,
        )
        .unwrap();
        assert_eq!(raw[0].id, "5");
        assert_eq!(raw[0].project.as_deref(), Some("Portal"));
    }
}
