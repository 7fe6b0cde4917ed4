use serde::Deserialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A saved pipeline run: which export to read and what to emit.
///
/// Paths are kept as written; callers resolve them against the directory
/// holding the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub source: SourceKind,
    pub input: String,
    /// Project lookup table for `toggl_api` / `clockify_api` dumps.
    #[serde(default)]
    pub projects: Option<String>,
    /// Tag lookup table, `clockify_api` only.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// JSON array of already-flattened API records.
    Api,
    Toggl,
    Clockify,
    /// Raw Toggl time entries plus a projects dump.
    TogglApi,
    /// Raw Clockify time entries plus projects and tags dumps.
    ClockifyApi,
}

impl SourceKind {
    pub fn needs_projects(&self) -> bool {
        matches!(self, Self::TogglApi | Self::ClockifyApi)
    }

    pub fn accepts_tags(&self) -> bool {
        matches!(self, Self::ClockifyApi)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Toggl => write!(f, "toggl"),
            Self::Clockify => write!(f, "clockify"),
            Self::TogglApi => write!(f, "toggl_api"),
            Self::ClockifyApi => write!(f, "clockify_api"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output + Submission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the batch JSON here as well as to stdout.
    #[serde(default)]
    pub json: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionConfig {
    /// Emit time posts instead of canonical records.
    #[serde(default)]
    pub posts: bool,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| PipelineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::ConfigValidation("name must not be empty".into()));
        }

        if self.input.trim().is_empty() {
            return Err(PipelineError::ConfigValidation("input must not be empty".into()));
        }

        match (&self.projects, self.source.needs_projects()) {
            (None, true) => {
                return Err(PipelineError::ConfigValidation(format!(
                    "source '{}' requires a projects file",
                    self.source
                )));
            }
            (Some(_), false) => {
                return Err(PipelineError::ConfigValidation(format!(
                    "source '{}' does not take a projects file",
                    self.source
                )));
            }
            _ => {}
        }

        if self.tags.is_some() && !self.source.accepts_tags() {
            return Err(PipelineError::ConfigValidation(format!(
                "source '{}' does not take a tags file",
                self.source
            )));
        }

        if let Some(json) = &self.output.json {
            if json.trim().is_empty() {
                return Err(PipelineError::ConfigValidation(
                    "output.json must not be empty when set".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
