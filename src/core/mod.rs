//! Core scheduling abstractions: records, quota policies and the engine loop.

pub mod audit;
pub mod engine;
pub mod error;
pub mod quota;
pub mod reclaim;
pub mod record;
pub mod runner;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use engine::{Engine, RunReport};
pub use error::{AppResult, SchedulerError};
pub use quota::{
    DualBudgetPolicy, FixedConcurrencyPolicy, FixedRatePolicy, QuotaPolicy, QuotaSnapshot,
    DEFAULT_WINDOW,
};
pub use reclaim::{Completion, ReclaimQueue};
pub use record::{
    BasicRecord, BasicRecordFactory, ChatRecord, ChatRecordFactory, EmbeddingRecord,
    EmbeddingRecordFactory, Payload, RecordFactory, RecordState, TaskRecord, Timing, TokenCounter,
    WhitespaceTokenCounter,
};
pub use runner::TaskRunner;
