//! Chat-completion record with an input token estimate.

use std::sync::Arc;

use serde_json::Value;

use super::{Payload, RecordFactory, RecordState, TaskRecord, TokenCounter};
use crate::util::{ResourceDemand, TaskId};

/// Record for one chat-completion request.
///
/// On construction `in_tokens` is derived from `text_in` (when it is a string)
/// and `text_out_list` is reset to an empty list.
pub struct ChatRecord {
    state: RecordState,
    counter: Arc<dyn TokenCounter>,
}

impl ChatRecord {
    /// Build and enrich the payload.
    #[must_use]
    pub fn new(task_id: TaskId, mut payload: Payload, counter: Arc<dyn TokenCounter>) -> Self {
        let in_tokens = payload
            .get("text_in")
            .and_then(Value::as_str)
            .map(|text| counter.count(text));
        if let Some(in_tokens) = in_tokens {
            payload.insert("in_tokens".into(), Value::from(in_tokens));
        }
        payload.insert("text_out_list".into(), Value::Array(Vec::new()));
        Self {
            state: RecordState::new(task_id, payload),
            counter,
        }
    }

    /// Prompt text, if present.
    #[must_use]
    pub fn text_in(&self) -> Option<&str> {
        self.state.payload().get("text_in").and_then(Value::as_str)
    }

    /// Estimated input tokens (zero when `text_in` was absent).
    #[must_use]
    pub fn in_tokens(&self) -> u64 {
        self.state
            .payload()
            .get("in_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Store completions and their total token count as `out_tokens`.
    pub fn set_outputs(&mut self, outputs: Vec<String>) {
        let out_tokens: usize = outputs.iter().map(|text| self.counter.count(text)).sum();
        let payload = self.state.payload_mut();
        payload.insert(
            "text_out_list".into(),
            Value::Array(outputs.into_iter().map(Value::String).collect()),
        );
        payload.insert("out_tokens".into(), Value::from(out_tokens));
    }
}

impl TaskRecord for ChatRecord {
    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn demand(&self) -> ResourceDemand {
        ResourceDemand::tokens(self.in_tokens())
    }
}

/// Factory for [`ChatRecord`], holding the shared token counter.
#[derive(Clone)]
pub struct ChatRecordFactory {
    counter: Arc<dyn TokenCounter>,
}

impl ChatRecordFactory {
    /// Factory counting tokens with `counter`.
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }
}

impl RecordFactory for ChatRecordFactory {
    type Record = ChatRecord;

    fn build(&self, task_id: TaskId, payload: Payload) -> ChatRecord {
        ChatRecord::new(task_id, payload, Arc::clone(&self.counter))
    }
}
