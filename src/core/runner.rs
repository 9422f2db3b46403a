//! Task runner abstraction.

use async_trait::async_trait;

use super::{AppResult, TaskRecord};

/// Performs the remote call for one attempt of a record.
///
/// The runner owns everything protocol-level: the client, timeouts and any
/// transport retries. It writes its results into the record's payload and
/// may refine the attempt timing through
/// [`RecordState::set_start_time`](super::record::RecordState::set_start_time) /
/// [`RecordState::set_end_time`](super::record::RecordState::set_end_time);
/// the engine stamps `start_time` at dispatch and fills a stale `end_time`
/// itself. It is called exactly once per dispatch.
///
/// Returning `Err` (or panicking) marks the attempt as failed; the engine then
/// retries or drops the task according to `max_task_runs`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_batch_runner::core::{AppResult, BasicRecord, TaskRecord, TaskRunner};
///
/// #[derive(Clone)]
/// struct Multiply;
///
/// #[async_trait]
/// impl TaskRunner<BasicRecord> for Multiply {
///     async fn run(&self, record: &mut BasicRecord) -> AppResult<()> {
///         let data = record.state_mut().payload_mut();
///         let a = data["a"].as_i64().unwrap_or(0);
///         let b = data["b"].as_i64().unwrap_or(0);
///         data.insert("result".into(), (a * b).into());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskRunner<R>: Send + Sync + Clone + 'static
where
    R: TaskRecord,
{
    /// Run one attempt against the backend.
    async fn run(&self, record: &mut R) -> AppResult<()>;
}
