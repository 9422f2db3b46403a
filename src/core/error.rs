//! Error types for scheduler operations.

use thiserror::Error;

use crate::util::TaskId;

/// Errors that terminate a batch run.
///
/// Runner failures never surface here: they are classified per task and drive
/// the retry-or-drop policy instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// An input line that had to be processed is not a JSON object.
    #[error("malformed input at line {line}: {source}")]
    InputParse {
        /// 1-based input line number (the task id).
        line: TaskId,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// Existing output could not be scanned for resume.
    #[error("malformed output at line {line}: {source}")]
    ResumeScan {
        /// 1-based output line number.
        line: u64,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// Input, output or artifact I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The auxiliary artifact stream rejected a write.
    #[error("artifact error: {0}")]
    Artifact(String),
    /// Engine configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A dispatched task could not be joined.
    #[error("task join failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Application-facing result using anyhow for higher-level contexts.
///
/// Task runners return this; any error counts as a failed attempt.
pub type AppResult<T> = Result<T, anyhow::Error>;
