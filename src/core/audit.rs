//! Audit trail of engine lifecycle events.
//!
//! Every admission, success, retry, drop and resume skip can be mirrored into
//! an [`AuditSink`] next to the structured log line. Events carry the engine
//! tick they happened on, so ordering can be checked without wall-clock time.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::util::clock::now_utc;
use crate::util::TaskId;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Dispatched to the runner.
    Admit,
    /// Succeeded and was written to output.
    Success,
    /// Failed and went back to the pending queue.
    Retry,
    /// Failed for the last time, or can never be admitted; not persisted.
    Drop,
    /// Already present in prior output; not enqueued.
    Skip,
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Engine tick, starting at 1.
    pub tick: u64,
    /// Task the event concerns.
    pub task_id: TaskId,
    /// Attempt number at the time of the event.
    pub run_id: u32,
    /// Action taken.
    pub action: AuditAction,
    /// Wall-clock time of the event.
    pub created_at: DateTime<Utc>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit sink for testing and dev.
///
/// Clones share the same buffer, so one clone can be handed to the engine
/// while another is kept for inspection.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events with the given action, in order.
    #[must_use]
    pub fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event stamped with the current time.
#[must_use]
pub fn build_audit_event(tick: u64, task_id: TaskId, run_id: u32, action: AuditAction) -> AuditEvent {
    AuditEvent {
        tick,
        task_id,
        run_id,
        action,
        created_at: now_utc(),
    }
}
