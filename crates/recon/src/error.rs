use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// CSV source tag is not one of the supported trackers.
    UnsupportedSource(String),
    /// API timestamp could not be parsed as ISO-8601.
    TimestampParse { field: String, value: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (unknown source, missing lookup file, etc.).
    ConfigValidation(String),
    /// CSV or JSON input text is malformed.
    InputParse(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSource(source) => write!(f, "{source} not implemented."),
            Self::TimestampParse { field, value } => {
                write!(f, "cannot parse {field} timestamp '{value}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InputParse(msg) => write!(f, "input parse error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}
