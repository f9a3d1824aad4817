//! Error taxonomy for the configuration lifecycle engine.
//!
//! Every fatal condition maps to exactly one variant here. A failing or
//! unlaunchable child process is deliberately absent from this taxonomy:
//! the controller reports it as an `Issue` diagnostic and keeps its own
//! success status (see `lifecycle::run`).

use std::path::PathBuf;
use thiserror::Error;

/// Engine result type alias
pub type Result<T> = std::result::Result<T, PrimordialError>;

/// Error category for structured logging and exit-path mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Descriptor missing/invalid, required path option missing
    Config,
    /// An expected file or directory is absent where a precondition requires it
    NotFound,
    /// A configuration document is not well-formed JSON
    Parse,
    /// Directory/file creation or write failure
    Io,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "CONFIG_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Parse => "PARSE_ERROR",
            Self::Io => "IO_ERROR",
        }
    }
}

/// Fatal lifecycle error with category and context
#[derive(Debug, Error)]
pub enum PrimordialError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("{what} does not exist: {path}")]
    NotFound { what: &'static str, path: PathBuf },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PrimordialError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Config,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a not-found error for a missing precondition path
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// Create a parse error for a malformed document
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Create an I/O error with the offending path attached
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
