//! Line-oriented JSON input.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::core::record::Payload;
use crate::core::SchedulerError;
use crate::util::TaskId;

/// Reads input one line at a time, numbering lines from 1.
///
/// Lines are handed out raw so skipped lines are never parsed.
pub struct JsonlInput {
    lines: Lines<BufReader<File>>,
    line_no: TaskId,
    exhausted: bool,
}

impl JsonlInput {
    /// Open the input file.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let file = File::open(path).await?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            exhausted: false,
        })
    }

    /// Next raw line with its 1-based number, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] on read failure.
    pub async fn next_line(&mut self) -> Result<Option<(TaskId, String)>, SchedulerError> {
        if self.exhausted {
            return Ok(None);
        }
        match self.lines.next_line().await? {
            Some(line) => {
                self.line_no += 1;
                Ok(Some((self.line_no, line)))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Stop reading; later calls to [`JsonlInput::next_line`] return `None`.
    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }

    /// Whether the stream has ended or reading was stopped.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Parse one input line as a JSON object.
///
/// # Errors
///
/// Returns [`SchedulerError::InputParse`] for anything but a JSON object.
pub fn parse_payload(task_id: TaskId, line: &str) -> Result<Payload, SchedulerError> {
    serde_json::from_str(line).map_err(|source| SchedulerError::InputParse {
        line: task_id,
        source,
    })
}
