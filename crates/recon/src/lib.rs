//! `sheetsync-recon` — Timesheet normalization engine.
//!
//! Pure engine crate: receives pre-loaded tracker records (API entries or CSV
//! rows), returns canonical records annotated with defects. No CLI or IO
//! dependencies.

pub mod config;
pub mod dates;
pub mod error;
pub mod load;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod submission;
pub mod summary;
pub mod ticket;
pub mod validate;

pub use config::{PipelineConfig, SourceKind};
pub use dates::Instant;
pub use error::PipelineError;
pub use load::{load_clockify_dump, load_csv_rows, load_raw_records, load_toggl_dump};
pub use mapper::CsvSource;
pub use model::{BatchResult, CanonicalRecord, CsvRow, RawApiRecord};
pub use pipeline::{process_api_records, process_csv_records};
pub use submission::{plan_submission, SubmissionPlan, TimePost};
pub use summary::{summarize, BatchSummary};
pub use validate::Defect;
