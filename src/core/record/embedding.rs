//! Embedding record: a batch of texts whose vectors go to the artifact stream.

use std::sync::Arc;

use serde_json::Value;

use super::{Payload, RecordFactory, RecordState, TaskRecord, TokenCounter};
use crate::core::SchedulerError;
use crate::infra::artifact::ArtifactSink;
use crate::util::{ResourceDemand, TaskId};

/// Record for one embedding batch.
///
/// The payload keeps `text_list`; the vectors themselves never enter the JSON
/// output. On success they are appended, in `text_list` order, to the shared
/// [`ArtifactSink`].
pub struct EmbeddingRecord {
    state: RecordState,
    vectors: Vec<Vec<f64>>,
    sink: ArtifactSink,
}

impl EmbeddingRecord {
    /// Build and derive `in_tokens` over `text_list`.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        mut payload: Payload,
        counter: &dyn TokenCounter,
        sink: ArtifactSink,
    ) -> Self {
        let in_tokens = payload.get("text_list").and_then(Value::as_array).map(|texts| {
            texts
                .iter()
                .filter_map(Value::as_str)
                .map(|text| counter.count(text))
                .sum::<usize>()
        });
        if let Some(in_tokens) = in_tokens {
            payload.insert("in_tokens".into(), Value::from(in_tokens));
        }
        Self {
            state: RecordState::new(task_id, payload),
            vectors: Vec::new(),
            sink,
        }
    }

    /// Texts to embed, in batch order.
    #[must_use]
    pub fn text_list(&self) -> Vec<&str> {
        self.state
            .payload()
            .get("text_list")
            .and_then(Value::as_array)
            .map(|texts| texts.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Estimated input tokens.
    #[must_use]
    pub fn in_tokens(&self) -> u64 {
        self.state
            .payload()
            .get("in_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Store the vectors produced by the runner, one per text.
    pub fn set_vectors(&mut self, vectors: Vec<Vec<f64>>) {
        self.vectors = vectors;
    }

    /// Vectors produced by the latest attempt.
    #[must_use]
    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }
}

impl TaskRecord for EmbeddingRecord {
    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn demand(&self) -> ResourceDemand {
        ResourceDemand::tokens(self.in_tokens())
    }

    fn on_success(&mut self) -> Result<(), SchedulerError> {
        let texts = self.text_list().len();
        if self.vectors.len() != texts {
            return Err(SchedulerError::Artifact(format!(
                "{}: {} vectors for {} texts",
                self.summary(),
                self.vectors.len(),
                texts
            )));
        }
        let written = self.sink.append_vectors(&self.vectors)?;
        tracing::debug!(task_id = self.task_id(), bytes = written, "appended vectors");
        Ok(())
    }
}

/// Factory for [`EmbeddingRecord`], holding the token counter and artifact sink.
#[derive(Clone)]
pub struct EmbeddingRecordFactory {
    counter: Arc<dyn TokenCounter>,
    sink: ArtifactSink,
}

impl EmbeddingRecordFactory {
    /// Factory writing vectors to `sink`.
    pub fn new(counter: Arc<dyn TokenCounter>, sink: ArtifactSink) -> Self {
        Self { counter, sink }
    }
}

impl RecordFactory for EmbeddingRecordFactory {
    type Record = EmbeddingRecord;

    fn build(&self, task_id: TaskId, payload: Payload) -> EmbeddingRecord {
        EmbeddingRecord::new(task_id, payload, self.counter.as_ref(), self.sink.clone())
    }
}
