//! `sheetsync csv|api|raw|run|validate` — batch mapping commands.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use sheetsync_recon::{
    load_clockify_dump, load_csv_rows, load_raw_records, load_toggl_dump, plan_submission,
    process_api_records, process_csv_records, summarize, BatchResult, PipelineConfig,
    PipelineError, SourceKind,
};

use crate::exit_codes::EXIT_DEFECTS;
use crate::CliError;

/// Output flags shared by every mapping command.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print the batch JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the batch JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Emit TargetProcess time posts instead of canonical records
    #[arg(long)]
    pub posts: bool,

    /// Exit 4 when any record has defects
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiSource {
    Toggl,
    Clockify,
}

// ---------------------------------------------------------------------------
// Batch inputs
// ---------------------------------------------------------------------------

/// Where one batch comes from, with every path already resolved.
#[derive(Debug)]
enum BatchInput {
    Csv { file: PathBuf, source: String },
    Raw { file: PathBuf },
    TogglApi { entries: PathBuf, projects: PathBuf },
    ClockifyApi { entries: PathBuf, projects: PathBuf, tags: Option<PathBuf> },
}

impl BatchInput {
    /// Build from a validated config, resolving paths against `base_dir`.
    fn from_config(config: &PipelineConfig, base_dir: &Path) -> Result<Self, CliError> {
        let input = base_dir.join(&config.input);
        let projects = || {
            config
                .projects
                .as_ref()
                .map(|p| base_dir.join(p))
                .ok_or_else(|| CliError::config(format!("source '{}' requires a projects file", config.source)))
        };

        Ok(match config.source {
            SourceKind::Api => Self::Raw { file: input },
            SourceKind::Toggl | SourceKind::Clockify => Self::Csv {
                file: input,
                source: config.source.to_string(),
            },
            SourceKind::TogglApi => Self::TogglApi { entries: input, projects: projects()? },
            SourceKind::ClockifyApi => Self::ClockifyApi {
                entries: input,
                projects: projects()?,
                tags: config.tags.as_ref().map(|t| base_dir.join(t)),
            },
        })
    }

    fn label(&self) -> String {
        match self {
            Self::Csv { source, .. } => format!("{source} csv"),
            Self::Raw { .. } => "api records".to_string(),
            Self::TogglApi { .. } => "toggl api".to_string(),
            Self::ClockifyApi { .. } => "clockify api".to_string(),
        }
    }

    /// Read and map the batch.
    ///
    /// Unreadable files are CLI errors. Malformed content becomes a failed
    /// batch so `--json` still prints one result object.
    fn process(&self) -> Result<BatchResult, CliError> {
        let mapped: Result<BatchResult, PipelineError> = match self {
            Self::Csv { file, source } => {
                let data = read_input(file)?;
                load_csv_rows(&data).map(|rows| process_csv_records(source, &rows))
            }
            Self::Raw { file } => {
                let data = read_input(file)?;
                load_raw_records(&data).map(|raw| process_api_records(&raw))
            }
            Self::TogglApi { entries, projects } => {
                let entries = read_input(entries)?;
                let projects = read_input(projects)?;
                load_toggl_dump(&entries, &projects).map(|raw| process_api_records(&raw))
            }
            Self::ClockifyApi { entries, projects, tags } => {
                let entries = read_input(entries)?;
                let projects = read_input(projects)?;
                let tags = tags.as_deref().map(read_input).transpose()?;
                load_clockify_dump(&entries, &projects, tags.as_deref()).map(|raw| process_api_records(&raw))
            }
        };
        Ok(mapped.unwrap_or_else(BatchResult::Failure))
    }
}

fn read_input(path: &Path) -> Result<String, CliError> {
    tracing::debug!(path = %path.display(), "reading input");
    std::fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn cmd_csv(file: PathBuf, source: String, output: OutputArgs) -> Result<(), CliError> {
    run_batch(BatchInput::Csv { file, source }, &output)
}

pub fn cmd_api(
    entries: PathBuf,
    source: ApiSource,
    projects: PathBuf,
    tags: Option<PathBuf>,
    output: OutputArgs,
) -> Result<(), CliError> {
    let input = match (source, tags) {
        (ApiSource::Toggl, Some(_)) => {
            return Err(CliError::usage("--tags is only used with --source clockify")
                .with_hint("Toggl entries carry tag names inline"));
        }
        (ApiSource::Toggl, None) => BatchInput::TogglApi { entries, projects },
        (ApiSource::Clockify, tags) => BatchInput::ClockifyApi { entries, projects, tags },
    };
    run_batch(input, &output)
}

pub fn cmd_raw(file: PathBuf, output: OutputArgs) -> Result<(), CliError> {
    run_batch(BatchInput::Raw { file }, &output)
}

pub fn cmd_run(config_path: PathBuf, flags: OutputArgs) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let input = BatchInput::from_config(&config, base_dir)?;

    // Flags add to what the config asks for; an explicit --output wins.
    let output = OutputArgs {
        json: flags.json,
        output: flags
            .output
            .or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p))),
        posts: flags.posts || config.submission.posts,
        strict: flags.strict || config.strict,
    };

    tracing::info!(name = %config.name, source = %config.source, "running pipeline");
    run_batch(input, &output)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let input = BatchInput::from_config(&config, base_dir)?;

    eprintln!(
        "valid: {} pipeline '{}' reading {}",
        config.source,
        config.name,
        base_dir.join(&config.input).display(),
    );
    tracing::debug!(?input, "resolved inputs");
    Ok(())
}

fn load_config(config_path: &Path) -> Result<PipelineConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;
    PipelineConfig::from_toml(&config_str).map_err(|e| CliError::pipeline(&e))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn run_batch(input: BatchInput, output: &OutputArgs) -> Result<(), CliError> {
    let label = input.label();
    let result = input.process()?;

    let records = match &result {
        BatchResult::Success(records) => records,
        BatchResult::Failure(err) => {
            write_json(&result, output)?;
            eprintln!("{label}: batch failed, no records produced");
            return Err(CliError::pipeline(err));
        }
    };

    let plan = output.posts.then(|| plan_submission(records));
    match &plan {
        Some(plan) => write_json(plan, output)?,
        None => write_json(&result, output)?,
    }

    // Human summary to stderr
    let s = summarize(records);
    eprintln!(
        "{label}: {} record(s), {} clean, {} with defects, {:.2} h total ({:.2} h billable)",
        s.total_records, s.clean_records, s.defective_records, s.total_hours, s.billable_hours,
    );
    for (defect, count) in &s.defect_counts {
        eprintln!("  {count:>4}  {defect}");
    }
    if let Some(plan) = &plan {
        eprintln!("posts: {} ready, {} skipped", plan.posts.len(), plan.skipped.len());
    }

    if output.strict && s.defective_records > 0 {
        return Err(CliError {
            code: EXIT_DEFECTS,
            message: format!("{} record(s) with defects", s.defective_records),
            hint: Some("fix the entries in the tracker, or run without --strict".to_string()),
        });
    }

    Ok(())
}

fn write_json<T: serde::Serialize>(value: &T, output: &OutputArgs) -> Result<(), CliError> {
    if !output.json && output.output.is_none() {
        return Ok(());
    }

    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output.output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if output.json {
        println!("{json_str}");
    }

    Ok(())
}
