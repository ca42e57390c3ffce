//! Error types for the lobsim replay system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the replay system.
///
/// Running out of rows or sessions is not an error; the engine reports it
/// through its step result.
#[derive(Error, Debug)]
pub enum Error {
    /// The archive or one of its session files cannot be opened.
    #[error("Cannot open {path}: {reason}")]
    ArchiveOpen { path: String, reason: String },

    /// A session row cannot be parsed.
    #[error("Parse error at row {row}: {reason}")]
    Parse { row: u64, reason: String },

    /// A collaborator precondition was violated.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create an archive open error.
    pub fn archive_open(path: impl Into<String>, reason: impl ToString) -> Self {
        Error::ArchiveOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a row parse error.
    pub fn parse(row: u64, reason: impl Into<String>) -> Self {
        Error::Parse {
            row,
            reason: reason.into(),
        }
    }

    /// Create an invariant violation.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the error aborts the replay because the input is unusable.
    pub fn is_input_failure(&self) -> bool {
        matches!(
            self,
            Error::ArchiveOpen { .. } | Error::Parse { .. } | Error::Io(_) | Error::Csv(_)
        )
    }
}
