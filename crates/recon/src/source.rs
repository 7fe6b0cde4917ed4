//! Tracker API payloads and their flattening into [`RawApiRecord`]s.
//!
//! Both trackers return entries that reference projects (and for Clockify,
//! tags) by id. Flattening resolves those ids against lookup tables fetched
//! alongside the entries.

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::RawApiRecord;

// ---------------------------------------------------------------------------
// Toggl
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TogglTimeEntry {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub billable: bool,
    pub start: String,
    /// Absent while the timer is running.
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TogglProject {
    pub id: u64,
    pub name: String,
}

/// Flatten Toggl entries, resolving project ids against `projects`.
///
/// Tag names are already inline on Toggl entries and are joined with `,`.
pub fn flatten_toggl_entries(entries: &[TogglTimeEntry], projects: &[TogglProject]) -> Vec<RawApiRecord> {
    let names: HashMap<u64, &str> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();

    entries
        .iter()
        .map(|entry| RawApiRecord {
            id: entry.id.to_string(),
            description: entry.description.clone(),
            project: entry
                .project_id
                .and_then(|id| names.get(&id))
                .and_then(|name| non_blank(name)),
            billable: entry.billable,
            tags: entry
                .tags
                .as_ref()
                .filter(|tags| !tags.is_empty())
                .map(|tags| tags.join(",")),
            start: Some(entry.start.clone()),
            end: entry.stop.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Clockify
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockifyTimeEntry {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
    pub time_interval: ClockifyTimeInterval,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClockifyTimeInterval {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockifyProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockifyTag {
    pub id: String,
    pub name: String,
}

/// Flatten Clockify entries, resolving project and tag ids.
///
/// Blank or unknown tag ids are skipped; the rest are joined with `", "`.
pub fn flatten_clockify_entries(
    entries: &[ClockifyTimeEntry],
    projects: &[ClockifyProject],
    tags: &[ClockifyTag],
) -> Vec<RawApiRecord> {
    let project_names: HashMap<&str, &str> =
        projects.iter().map(|p| (p.id.as_str(), p.name.as_str())).collect();
    let tag_names: HashMap<&str, &str> = tags.iter().map(|t| (t.id.as_str(), t.name.as_str())).collect();

    entries
        .iter()
        .map(|entry| {
            let project = entry
                .project_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .and_then(|id| project_names.get(id))
                .and_then(|name| non_blank(name));

            let resolved: Vec<&str> = entry
                .tag_ids
                .iter()
                .flatten()
                .filter(|id| !id.trim().is_empty())
                .filter_map(|id| tag_names.get(id.as_str()).copied())
                .filter(|name| !name.trim().is_empty())
                .collect();

            RawApiRecord {
                id: entry.id.clone(),
                description: entry.description.clone(),
                project,
                billable: entry.billable,
                tags: (!resolved.is_empty()).then(|| resolved.join(", ")),
                start: Some(entry.time_interval.start.clone()),
                end: entry.time_interval.end.clone(),
            }
        })
        .collect()
}

fn non_blank(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggl_entries_from_json() {
        let entries: Vec<TogglTimeEntry> = serde_json::from_str(
            r#"[
                {"id": 101, "description": "Fix TP9", "project_id": 7, "billable": true,
                 "start": "2024-03-04T09:00:00Z", "stop": "2024-03-04T10:00:00Z",
                 "tags": ["dev", "urgent"]},
                {"id": 102, "description": null, "project_id": null, "billable": false,
                 "start": "2024-03-04T11:00:00Z", "stop": null, "tags": null}
            ]"#,
        )
        .unwrap();
        let projects = vec![TogglProject { id: 7, name: "Portal".into() }];

        let raw = flatten_toggl_entries(&entries, &projects);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].id, "101");
        assert_eq!(raw[0].project.as_deref(), Some("Portal"));
        assert_eq!(raw[0].tags.as_deref(), Some("dev,urgent"));
        assert!(raw[0].billable);
        assert_eq!(raw[0].end.as_deref(), Some("2024-03-04T10:00:00Z"));

        assert_eq!(raw[1].id, "102");
        assert!(raw[1].project.is_none());
        assert!(raw[1].tags.is_none());
        assert!(raw[1].end.is_none());
    }

    #[test]
    fn toggl_unknown_or_blank_project_is_absent() {
        let entries = vec![
            TogglTimeEntry { id: 1, project_id: Some(99), start: "x".into(), ..Default::default() },
            TogglTimeEntry { id: 2, project_id: Some(5), start: "x".into(), ..Default::default() },
        ];
        let projects = vec![TogglProject { id: 5, name: "  ".into() }];
        let raw = flatten_toggl_entries(&entries, &projects);
        assert!(raw.iter().all(|r| r.project.is_none()));
    }

    #[test]
    fn clockify_entries_from_json() {
        let entries: Vec<ClockifyTimeEntry> = serde_json::from_str(
            r#"[{
                "id": "abc", "description": "Deploy", "projectId": "p1", "billable": true,
                "tagIds": ["t1", "", "missing", "t2"],
                "timeInterval": {"start": "2024-03-04T09:00:00Z", "end": "2024-03-04T09:45:00Z"}
            }]"#,
        )
        .unwrap();
        let projects = vec![ClockifyProject { id: "p1".into(), name: "Ops TP55".into() }];
        let tags = vec![
            ClockifyTag { id: "t1".into(), name: "infra".into() },
            ClockifyTag { id: "t2".into(), name: "release".into() },
        ];

        let raw = flatten_clockify_entries(&entries, &projects, &tags);
        assert_eq!(raw[0].id, "abc");
        assert_eq!(raw[0].project.as_deref(), Some("Ops TP55"));
        assert_eq!(raw[0].tags.as_deref(), Some("infra, release"));
        assert_eq!(raw[0].start.as_deref(), Some("2024-03-04T09:00:00Z"));
        assert_eq!(raw[0].end.as_deref(), Some("2024-03-04T09:45:00Z"));
    }

    #[test]
    fn clockify_without_tags_or_project() {
        let entries = vec![ClockifyTimeEntry {
            id: "e".into(),
            project_id: Some(" ".into()),
            tag_ids: Some(vec![]),
            ..Default::default()
        }];
        let raw = flatten_clockify_entries(&entries, &[], &[]);
        assert!(raw[0].project.is_none());
        assert!(raw[0].tags.is_none());
    }
}
