//! Batch entry points.
//!
//! A batch either maps completely or fails as a whole. Output order always
//! equals input order.

use crate::error::PipelineError;
use crate::mapper::{self, CsvSource};
use crate::model::{BatchResult, CanonicalRecord, CsvRow, RawApiRecord};

/// Map a batch of flattened API entries.
pub fn process_api_records(records: &[RawApiRecord]) -> BatchResult {
    log::debug!("mapping {} api records", records.len());
    let result = records
        .iter()
        .map(|raw| {
            mapper::map_api_record(raw).inspect_err(|e| {
                log::warn!("api record {} aborted the batch: {e}", raw.id);
            })
        })
        .collect::<Result<Vec<_>, _>>();
    finish(result)
}

/// Map a batch of CSV rows exported by the tracker named by `source_tag`.
///
/// An unknown tag fails the batch even when `rows` is empty.
pub fn process_csv_records(source_tag: &str, rows: &[CsvRow]) -> BatchResult {
    let source = match source_tag.parse::<CsvSource>() {
        Ok(source) => source,
        Err(e) => {
            log::warn!("csv batch rejected: {e}");
            return BatchResult::Failure(e);
        }
    };
    log::debug!("mapping {} {source} csv rows", rows.len());
    finish(Ok(rows.iter().map(|row| source.map_row(row)).collect()))
}

fn finish(result: Result<Vec<CanonicalRecord>, PipelineError>) -> BatchResult {
    if let Ok(records) = &result {
        let defective = records.iter().filter(|r| r.has_defects()).count();
        log::debug!("mapped {} records, {defective} with defects", records.len());
    }
    BatchResult::from(result)
}
