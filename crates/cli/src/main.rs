// sheetsync CLI - normalize time-tracker exports into canonical records

mod exit_codes;
mod sync;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{pipeline_exit_code, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use sync::{ApiSource, OutputArgs};

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  sheetsync-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

#[derive(Parser)]
#[command(name = "sheetsync")]
#[command(about = "Normalize Toggl and Clockify time entries for TargetProcess submission")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a tracker "detailed report" CSV export
    #[command(after_help = "\
Examples:
  sheetsync csv march.csv --source toggl
  sheetsync csv march.csv --source clockify --json
  sheetsync csv march.csv --source toggl --posts --strict --output posts.json")]
    Csv {
        /// CSV export file
        file: PathBuf,

        /// Tracker that produced the export (toggl or clockify)
        #[arg(long, short = 's')]
        source: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Map raw tracker API dumps (time entries plus lookup tables)
    #[command(after_help = "\
Examples:
  sheetsync api entries.json --source toggl --projects projects.json
  sheetsync api entries.json --source clockify --projects projects.json --tags tags.json --json")]
    Api {
        /// Time entries JSON array as returned by the tracker API
        entries: PathBuf,

        /// Tracker that produced the dump
        #[arg(long, short = 's', value_enum)]
        source: ApiSource,

        /// Projects JSON array used to resolve project ids
        #[arg(long)]
        projects: PathBuf,

        /// Tags JSON array used to resolve tag ids (Clockify only)
        #[arg(long)]
        tags: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Map a JSON array of already-flattened API records
    #[command(after_help = "\
Examples:
  sheetsync raw records.json --json")]
    Raw {
        /// Flattened records JSON file
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a pipeline from a TOML config file
    #[command(after_help = "\
Examples:
  sheetsync run march.sheetsync.toml
  sheetsync run march.sheetsync.toml --json
  sheetsync run march.sheetsync.toml --posts --strict")]
    Run {
        /// Path to the pipeline config file
        config: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate a pipeline config without running it
    #[command(after_help = "\
Examples:
  sheetsync validate march.sheetsync.toml")]
    Validate {
        /// Path to the pipeline config file
        config: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Csv { file, source, output } => sync::cmd_csv(file, source, output),
        Commands::Api { entries, source, projects, tags, output } => {
            sync::cmd_api(entries, source, projects, tags, output)
        }
        Commands::Raw { file, output } => sync::cmd_raw(file, output),
        Commands::Run { config, output } => sync::cmd_run(config, output),
        Commands::Validate { config } => sync::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code.
    pub fn pipeline(err: &sheetsync_recon::PipelineError) -> Self {
        use sheetsync_recon::PipelineError;
        let hint = match err {
            PipelineError::UnsupportedSource(_) => Some("supported sources: toggl, clockify".to_string()),
            PipelineError::TimestampParse { .. } => {
                Some("API timestamps must be ISO-8601, e.g. 2024-03-04T09:00:00Z".to_string())
            }
            _ => None,
        };
        Self { code: pipeline_exit_code(err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
