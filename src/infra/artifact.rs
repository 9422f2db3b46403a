//! Auxiliary binary artifact stream for vector outputs.
//!
//! The stream is a bare sequence of little-endian IEEE-754 `f64` values: no
//! header, no length prefix, no delimiter. Readers must know the vector
//! dimension and take the batch structure from the JSONL output, whose lines
//! appear in the same order the vectors were appended.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::SchedulerError;

const F64_WIDTH: usize = std::mem::size_of::<f64>();

/// Shared, append-only writer for vector bytes.
///
/// Cloning is cheap; all clones write to the same underlying stream.
#[derive(Clone)]
pub struct ArtifactSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ArtifactSink {
    /// Wrap any writer.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Open a file-backed sink. `truncate` mirrors the output rewrite mode;
    /// otherwise bytes are appended so a resumed run stays aligned with the
    /// lines already in the output.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, truncate: bool) -> Result<Self, SchedulerError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        Ok(Self::new(options.open(path)?))
    }

    /// Append every vector, in order, then flush. Returns bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] on write or flush failure.
    pub fn append_vectors(&self, vectors: &[Vec<f64>]) -> Result<usize, SchedulerError> {
        let bytes: Vec<u8> = vectors
            .iter()
            .flatten()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        let mut writer = self.writer.lock();
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(bytes.len())
    }
}

/// Slice an artifact byte stream back into vectors of `dimension` values.
///
/// # Errors
///
/// Returns [`SchedulerError::Artifact`] if `dimension` is zero or the stream
/// length is not a whole number of vectors.
pub fn read_vectors(bytes: &[u8], dimension: usize) -> Result<Vec<Vec<f64>>, SchedulerError> {
    if dimension == 0 {
        return Err(SchedulerError::Artifact("dimension must be positive".into()));
    }
    let vector_width = dimension * F64_WIDTH;
    if bytes.len() % vector_width != 0 {
        return Err(SchedulerError::Artifact(format!(
            "{} bytes is not a multiple of {vector_width}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(vector_width)
        .map(|vector| {
            vector
                .chunks_exact(F64_WIDTH)
                .map(|raw| {
                    let mut buf = [0u8; F64_WIDTH];
                    buf.copy_from_slice(raw);
                    f64::from_le_bytes(buf)
                })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_mode_keeps_earlier_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.bin");

        ArtifactSink::open(&path, true).unwrap().append_vectors(&[vec![1.0]]).unwrap();
        ArtifactSink::open(&path, false).unwrap().append_vectors(&[vec![2.0]]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(read_vectors(&bytes, 1).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_truncate_mode_discards_earlier_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.bin");

        ArtifactSink::open(&path, true).unwrap().append_vectors(&[vec![1.0]]).unwrap();
        ArtifactSink::open(&path, true).unwrap().append_vectors(&[vec![2.0]]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(read_vectors(&bytes, 1).unwrap(), vec![vec![2.0]]);
    }

    #[test]
    fn test_read_vectors_rejects_partial_stream() {
        assert!(read_vectors(&[0u8; 12], 1).is_err());
        assert!(read_vectors(&[0u8; 16], 0).is_err());
        assert!(read_vectors(&[], 4).unwrap().is_empty());
    }
}
