//! Append-only JSONL output, doubling as resume state.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::core::SchedulerError;
use crate::util::TaskId;

/// The only field resume needs from an output line.
#[derive(Deserialize)]
struct CompletedLine {
    task_id: TaskId,
}

/// Collect every `task_id` already recorded in `path`. A missing file means
/// nothing has completed yet.
///
/// # Errors
///
/// Returns [`SchedulerError::ResumeScan`] for a line that is not an output
/// record, or [`SchedulerError::Io`] on read failure.
pub async fn scan_completed(path: impl AsRef<Path>) -> Result<HashSet<TaskId>, SchedulerError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(err) => return Err(err.into()),
    };

    let mut completed = HashSet::new();
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let done: CompletedLine = serde_json::from_str(&line)
            .map_err(|source| SchedulerError::ResumeScan { line: line_no, source })?;
        completed.insert(done.task_id);
    }
    Ok(completed)
}

/// Output sink; every append is flushed before returning.
pub struct JsonlOutput {
    file: File,
}

impl JsonlOutput {
    /// Open for appending, or truncate first when `rewrite` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>, rewrite: bool) -> Result<Self, SchedulerError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if rewrite {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        Ok(Self {
            file: options.open(path).await?,
        })
    }

    /// Append one line and flush.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] on write or flush failure.
    pub async fn append(&mut self, line: &str) -> Result<(), SchedulerError> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.file.write_all(&buf).await?;
        self.file.flush().await?;
        Ok(())
    }
}
