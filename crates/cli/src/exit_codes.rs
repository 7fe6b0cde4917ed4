//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (defects alone do not fail without --strict) |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, unknown source)           |
//! | 3    | Batch failed; no records were produced               |
//! | 4    | Records with defects found and --strict was given    |
//! | 5    | Invalid pipeline config                              |
//! | 6    | I/O error (read input, write output)                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported source tag.
pub const EXIT_USAGE: u8 = 2;

/// A structural error (malformed timestamp, unparseable input) aborted the
/// whole batch.
pub const EXIT_BATCH_FAILED: u8 = 3;

/// The batch mapped, but at least one record carries defects and the run
/// was strict.
pub const EXIT_DEFECTS: u8 = 4;

/// Pipeline config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Input could not be read or output could not be written.
pub const EXIT_IO: u8 = 6;

/// Map an engine error to its exit code.
pub fn pipeline_exit_code(err: &sheetsync_recon::PipelineError) -> u8 {
    use sheetsync_recon::PipelineError;
    match err {
        PipelineError::UnsupportedSource(_) => EXIT_USAGE,
        PipelineError::TimestampParse { .. } | PipelineError::InputParse(_) => EXIT_BATCH_FAILED,
        PipelineError::ConfigParse(_) | PipelineError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
    }
}
