use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::CanonicalRecord;

/// Totals over one mapped batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub clean_records: usize,
    pub defective_records: usize,
    /// Sum of finite positive durations, rounded to two places.
    pub total_hours: f64,
    pub billable_hours: f64,
    /// Defect message → number of records carrying it.
    pub defect_counts: BTreeMap<String, usize>,
}

pub fn summarize(records: &[CanonicalRecord]) -> BatchSummary {
    let mut summary = BatchSummary {
        total_records: records.len(),
        ..Default::default()
    };

    for record in records {
        if record.has_defects() {
            summary.defective_records += 1;
        } else {
            summary.clean_records += 1;
        }
        for defect in &record.errors {
            *summary.defect_counts.entry(defect.clone()).or_insert(0) += 1;
        }
        if let Some(hours) = record.duration_decimal.filter(|h| h.is_finite() && *h > 0.0) {
            summary.total_hours += hours;
            if record.billable {
                summary.billable_hours += hours;
            }
        }
    }

    summary.total_hours = round_hours(summary.total_hours);
    summary.billable_hours = round_hours(summary.billable_hours);
    summary
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
