use std::fmt;

use crate::model::CanonicalRecord;

/// A missing or unusable field that blocks submission.
///
/// Defects annotate a record; they never remove it from the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Defect {
    InvalidStartDate,
    NoDescription,
    NoDecimalHours,
    NoTicketNumber,
}

impl Defect {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidStartDate => "Invalid start date",
            Self::NoDescription => "No description",
            Self::NoDecimalHours => "No decimal hours",
            Self::NoTicketNumber => "No target process number",
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Every check runs; the result lists defects in check order.
pub fn find_defects(record: &CanonicalRecord) -> Vec<Defect> {
    let mut defects = Vec::new();

    if !record.start_date.is_some_and(|d| d.is_valid()) {
        defects.push(Defect::InvalidStartDate);
    }

    let has_description = record
        .description
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !has_description {
        defects.push(Defect::NoDescription);
    }

    if !record.duration_decimal.is_some_and(|h| h.is_finite() && h > 0.0) {
        defects.push(Defect::NoDecimalHours);
    }

    if record.target_process_number.unwrap_or(0) == 0 {
        defects.push(Defect::NoTicketNumber);
    }

    defects
}

/// Defect messages for `record`, empty when it is ready to submit.
pub fn validate(record: &CanonicalRecord) -> Vec<String> {
    find_defects(record)
        .into_iter()
        .map(|d| d.message().to_string())
        .collect()
}
