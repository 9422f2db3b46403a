//! Plain record with no derived cost.

use super::{Payload, RecordFactory, RecordState, TaskRecord};
use crate::util::TaskId;

/// Record carrying its payload as-is.
#[derive(Debug, Clone)]
pub struct BasicRecord {
    state: RecordState,
}

impl BasicRecord {
    /// Wrap a payload.
    #[must_use]
    pub fn new(task_id: TaskId, payload: Payload) -> Self {
        Self {
            state: RecordState::new(task_id, payload),
        }
    }
}

impl TaskRecord for BasicRecord {
    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }
}

/// Factory for [`BasicRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRecordFactory;

impl RecordFactory for BasicRecordFactory {
    type Record = BasicRecord;

    fn build(&self, task_id: TaskId, payload: Payload) -> BasicRecord {
        BasicRecord::new(task_id, payload)
    }
}
