//! Conversion of clean records into project-tracker time posts.

use serde::Serialize;

use crate::dates;
use crate::model::CanonicalRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignable {
    #[serde(rename = "Id")]
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Invoiceable {
    Invoiceable,
    #[serde(rename = "Non-Invoiceable")]
    NonInvoiceable,
}

impl From<bool> for Invoiceable {
    fn from(billable: bool) -> Self {
        if billable {
            Self::Invoiceable
        } else {
            Self::NonInvoiceable
        }
    }
}

/// One time post in the tracker's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePost {
    pub assignable: Assignable,
    pub description: String,
    pub spent: f64,
    pub date: String,
    pub invoiceable: Invoiceable,
}

/// A record held back from submission, by its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub defects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionPlan {
    pub posts: Vec<TimePost>,
    pub skipped: Vec<SkippedRecord>,
}

/// Build the post for a clean record. `None` when the record has defects.
pub fn to_time_post(record: &CanonicalRecord) -> Option<TimePost> {
    if record.has_defects() {
        return None;
    }
    Some(TimePost {
        assignable: Assignable { id: record.target_process_number? },
        description: record.description.clone()?,
        spent: record.duration_decimal?,
        date: record.start_date.and_then(dates::format_iso)?,
        invoiceable: Invoiceable::from(record.billable),
    })
}

/// Split a batch into posts and skipped records, keeping batch order.
pub fn plan_submission(records: &[CanonicalRecord]) -> SubmissionPlan {
    let mut plan = SubmissionPlan::default();
    for (index, record) in records.iter().enumerate() {
        match to_time_post(record) {
            Some(post) => plan.posts.push(post),
            None => plan.skipped.push(SkippedRecord {
                index,
                defects: record.errors.clone(),
            }),
        }
    }
    log::debug!(
        "submission plan: {} posts, {} skipped",
        plan.posts.len(),
        plan.skipped.len()
    );
    plan
}
