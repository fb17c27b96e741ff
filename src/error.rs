//! Error types for the benchmark runner.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors that can occur while configuring or running a benchmark.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of a JSONL input file could not be parsed.
    #[error("Invalid record at {path}:{line}: {message}")]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Missing or inconsistent configuration (unknown provider, unknown
    /// backend, missing backend parameters, malformed config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote service answered with a payload of the wrong shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure talking to a remote service.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A remote service answered with a non-2xx status.
    #[error("HTTP {status} from '{url}': {body}")]
    HttpStatus { url: String, status: u16, body: String },
}

/// Coarse error classes used when reporting run failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Transport,
    Input,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::Input => "input",
        };
        f.write_str(name)
    }
}

impl BenchError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::Config(_) => ErrorKind::Configuration,
            BenchError::Validation(_) => ErrorKind::Validation,
            BenchError::Http(_) | BenchError::HttpStatus { .. } => ErrorKind::Transport,
            BenchError::Io { .. } | BenchError::InvalidRecord { .. } | BenchError::Serialization(_) => {
                ErrorKind::Input
            }
        }
    }
}

impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        BenchError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err.to_string())
    }
}
