//! Task records: identity, attempt bookkeeping, timing and payload.
//!
//! A record is built once per admitted input line by a [`RecordFactory`] and
//! lives until it is either serialized to output (success) or dropped after
//! exhausting its retry budget. Its `task_id` never changes; each dispatch bumps
//! `run_id` by exactly one and re-stamps the attempt timing.
//!
//! The shared bookkeeping lives in [`RecordState`]; variants embed it and add
//! their own payload enrichment, resource demand and success hook:
//!
//! - [`BasicRecord`]: plain payload, no token notion.
//! - [`ChatRecord`]: derives `in_tokens` from `text_in` for token-budgeted policies.
//! - [`EmbeddingRecord`]: derives `in_tokens` from `text_list` and appends the
//!   produced vectors to the auxiliary artifact stream on success.

mod basic;
mod chat;
mod embedding;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::SchedulerError;
use crate::util::clock::{epoch, to_iso8601};
use crate::util::{ResourceDemand, TaskId};

pub use basic::{BasicRecord, BasicRecordFactory};
pub use chat::{ChatRecord, ChatRecordFactory};
pub use embedding::{EmbeddingRecord, EmbeddingRecordFactory};

/// Structured task payload: one JSON object per input line.
pub type Payload = Map<String, Value>;

/// Wall-clock timing of the most recent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// When the attempt started.
    pub start_time: DateTime<Utc>,
    /// When the attempt ended.
    pub end_time: DateTime<Utc>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            start_time: epoch(),
            end_time: epoch(),
        }
    }
}

/// Durable output line shape.
#[derive(Serialize)]
struct OutputLine<'a> {
    task_id: TaskId,
    data: &'a Payload,
    start_time: String,
    end_time: String,
}

/// Bookkeeping shared by every record variant.
#[derive(Debug, Clone)]
pub struct RecordState {
    task_id: TaskId,
    run_id: u32,
    payload: Payload,
    timing: Timing,
    success_claimed: bool,
}

impl RecordState {
    /// Fresh state for a task that has never been dispatched.
    #[must_use]
    pub fn new(task_id: TaskId, payload: Payload) -> Self {
        Self {
            task_id,
            run_id: 0,
            payload,
            timing: Timing::default(),
            success_claimed: false,
        }
    }

    /// Stable task identity.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Number of dispatches so far.
    #[must_use]
    pub const fn run_id(&self) -> u32 {
        self.run_id
    }

    /// Current payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Mutable payload; runners add their result fields here.
    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    /// Timing of the most recent attempt.
    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Override the attempt start time.
    pub fn set_start_time(&mut self, ts: DateTime<Utc>) {
        self.timing.start_time = ts;
    }

    /// Override the attempt end time.
    pub fn set_end_time(&mut self, ts: DateTime<Utc>) {
        self.timing.end_time = ts;
    }

    /// Log identifier, `task#<id> run#<attempt>`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("task#{} run#{}", self.task_id, self.run_id)
    }

    /// Serialize as one output line (without the trailing newline).
    ///
    /// # Errors
    ///
    /// Fails only if the payload cannot be encoded as JSON.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&OutputLine {
            task_id: self.task_id,
            data: &self.payload,
            start_time: to_iso8601(&self.timing.start_time),
            end_time: to_iso8601(&self.timing.end_time),
        })
    }

    /// Start a new attempt: bump `run_id` and stamp the start time.
    pub(crate) fn begin_attempt(&mut self, now: DateTime<Utc>) -> u32 {
        self.run_id += 1;
        self.timing = Timing {
            start_time: now,
            end_time: epoch(),
        };
        self.run_id
    }

    /// Close a successful attempt, filling `end_time` if the runner left it stale.
    pub(crate) fn finish_success(&mut self, now: DateTime<Utc>) {
        if self.timing.end_time < self.timing.start_time {
            self.timing.end_time = now;
        }
    }

    /// Returns true the first time only.
    pub(crate) fn claim_success(&mut self) -> bool {
        !std::mem::replace(&mut self.success_claimed, true)
    }
}

/// One unit of work as seen by the engine.
///
/// Implementors only provide access to their [`RecordState`]; everything else
/// has a default. Override [`TaskRecord::demand`] to take part in token
/// budgets and [`TaskRecord::on_success`] for once-per-task side effects.
pub trait TaskRecord: Send + 'static {
    /// Shared bookkeeping.
    fn state(&self) -> &RecordState;

    /// Shared bookkeeping, mutably.
    fn state_mut(&mut self) -> &mut RecordState;

    /// Resource demand presented to the quota policy.
    fn demand(&self) -> ResourceDemand {
        ResourceDemand::none()
    }

    /// Hook run exactly once, on the successful attempt, before serialization.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the batch: it means an auxiliary sink failed.
    fn on_success(&mut self) -> Result<(), SchedulerError> {
        Ok(())
    }

    /// Stable task identity.
    fn task_id(&self) -> TaskId {
        self.state().task_id()
    }

    /// Number of dispatches so far.
    fn run_id(&self) -> u32 {
        self.state().run_id()
    }

    /// Log identifier, `task#<id> run#<attempt>`.
    fn summary(&self) -> String {
        self.state().summary()
    }

    /// Durable representation: `{task_id, data, start_time, end_time}`.
    ///
    /// # Errors
    ///
    /// Fails only if the payload cannot be encoded as JSON.
    fn serialize(&self) -> Result<String, SchedulerError> {
        Ok(self.state().to_json_line()?)
    }
}

/// Builds records from input lines.
///
/// Factories carry whatever shared context their records need (token
/// counters, artifact sinks) so nothing lives in globals.
pub trait RecordFactory: Send {
    /// Record type produced.
    type Record: TaskRecord;

    /// Build a record for `task_id`. Enrichment must be pure.
    fn build(&self, task_id: TaskId, payload: Payload) -> Self::Record;
}

/// Token counting capability used for cost estimates.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

/// Counts whitespace-separated words. A rough stand-in when no real tokenizer
/// is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
