use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Provider returned no content")]
    EmptyResponse,
}

/// Failures of the classification capability. Each variant maps onto an
/// [`ErrorKind`] so it can be recorded against the unit of work that failed.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Malformed model output: {0}")]
    Classification(String),

    #[error("Transport failure: {0}")]
    Transport(#[from] ProviderError),

    #[error("Model initialization failed: {0}")]
    ModelInitialization(String),
}

impl ClassifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierError::InputValidation(_) => ErrorKind::InputValidation,
            ClassifierError::Classification(_) => ErrorKind::Classification,
            ClassifierError::Transport(_) => ErrorKind::Transport,
            // Only raised at construction; if one slips through treat it as transport.
            ClassifierError::ModelInitialization(_) => ErrorKind::Transport,
        }
    }
}

/// The reduce-stage synthesis call failed. Counts stay valid.
#[derive(Error, Debug)]
#[error("Narrative synthesis failed: {source}")]
pub struct AggregationError {
    #[from]
    pub source: ClassifierError,
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read reviews file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Failed to parse reviews file: {0}")]
    Document(#[from] serde_json::Error),

    #[error("No usable reviews in '{0}'")]
    Empty(PathBuf),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Category of a contained failure, recorded on the review or chunk it hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputValidation,
    Classification,
    Transport,
    Aggregation,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InputValidation => write!(f, "input_validation"),
            ErrorKind::Classification => write!(f, "classification"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Aggregation => write!(f, "aggregation"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ClassifierError> for ErrorRecord {
    fn from(err: &ClassifierError) -> Self {
        ErrorRecord::new(err.kind(), err.to_string())
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
