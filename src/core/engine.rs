//! The scheduling engine: a cooperative sweep/reclaim/refill/admit loop.
//!
//! One tick:
//!
//! 1. **Sweep** every finished attempt. Successes run their hook and are
//!    appended (and flushed) to output; failures go back to the tail of the
//!    pending queue until `max_task_runs` is reached, then are dropped. Every
//!    completion is pushed onto the reclamation queue.
//! 2. **Reclaim** budget through the quota policy.
//! 3. **Refill** one record from input when nothing is pending.
//! 4. **Stop** once nothing is pending or running.
//! 5. **Admit** at most the head of the pending queue.
//!
//! The loop sleeps `poll_interval` before every tick. Runner futures are
//! spawned onto the Tokio runtime and collected without blocking, so the
//! output is in completion order.

use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::quota::QuotaPolicy;
use crate::core::reclaim::ReclaimQueue;
use crate::core::record::{RecordFactory, TaskRecord};
use crate::core::runner::TaskRunner;
use crate::core::{AppResult, SchedulerError};
use crate::infra::{parse_payload, scan_completed, JsonlInput, JsonlOutput};
use crate::util::clock::now_utc;
use crate::util::{ResourceDemand, TaskId};

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier of this run, also attached to every log line.
    pub run: Uuid,
    /// Tasks written to output by this run.
    pub succeeded: usize,
    /// Tasks given up on, in drop order. None of them reached the output.
    pub dropped: Vec<TaskId>,
    /// Input lines skipped because prior output already holds them.
    pub skipped: usize,
    /// Dispatches performed, retries included.
    pub attempts: usize,
    /// Largest number of simultaneously running attempts.
    pub peak_running: usize,
    /// Ticks executed.
    pub ticks: u64,
}

impl RunReport {
    fn new(run: Uuid) -> Self {
        Self {
            run,
            succeeded: 0,
            dropped: Vec::new(),
            skipped: 0,
            attempts: 0,
            peak_running: 0,
            ticks: 0,
        }
    }
}

/// What a spawned attempt hands back to the loop.
struct Finished<R> {
    record: R,
    charged: ResourceDemand,
    outcome: AppResult<()>,
}

struct LoopState<R> {
    pending: VecDeque<R>,
    running: JoinSet<Finished<R>>,
    completions: ReclaimQueue,
    report: RunReport,
}

impl<R: TaskRecord> LoopState<R> {
    fn new(run: Uuid) -> Self {
        Self {
            pending: VecDeque::new(),
            running: JoinSet::new(),
            completions: ReclaimQueue::new(),
            report: RunReport::new(run),
        }
    }
}

/// Resumable, quota-governed batch executor.
///
/// Build one with [`EngineBuilder`](crate::builders::EngineBuilder) or
/// [`Engine::new`], then call [`Engine::run`] inside a Tokio runtime.
pub struct Engine<F, X>
where
    F: RecordFactory,
    X: TaskRunner<F::Record>,
{
    config: EngineConfig,
    factory: F,
    runner: X,
    policy: Box<dyn QuotaPolicy>,
    audit: Option<Box<dyn AuditSink>>,
}

impl<F, X> Engine<F, X>
where
    F: RecordFactory,
    X: TaskRunner<F::Record>,
{
    /// Assemble an engine from its parts. The config is validated by [`Engine::run`].
    pub fn new(config: EngineConfig, factory: F, runner: X, policy: Box<dyn QuotaPolicy>) -> Self {
        Self {
            config,
            factory,
            runner,
            policy,
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process the whole input, returning once nothing is pending or running.
    ///
    /// # Errors
    ///
    /// Only batch-fatal conditions: invalid configuration, a malformed input
    /// line, malformed prior output, or I/O failure on input, output or an
    /// auxiliary sink. Runner failures are handled per task.
    pub async fn run(self) -> Result<RunReport, SchedulerError> {
        let run = Uuid::new_v4();
        let span = tracing::info_span!("batch", %run);
        self.drive(run).instrument(span).await
    }

    async fn drive(mut self, run: Uuid) -> Result<RunReport, SchedulerError> {
        self.config
            .validate()
            .map_err(SchedulerError::InvalidConfig)?;

        let completed = if self.config.rewrite_output {
            HashSet::new()
        } else {
            scan_completed(&self.config.output_path).await?
        };
        if !completed.is_empty() {
            info!(completed = completed.len(), "resuming from existing output");
        }

        let mut input = JsonlInput::open(&self.config.input_path).await?;
        let mut output =
            JsonlOutput::open(&self.config.output_path, self.config.rewrite_output).await?;
        let mut state = LoopState::new(run);

        info!(
            policy = self.policy.name(),
            max_task_runs = self.config.max_task_runs,
            "batch started"
        );
        let poll_interval = self.config.poll_interval();
        if let Err(err) = self
            .tick_loop(&mut state, &mut input, &mut output, &completed, poll_interval)
            .await
        {
            error!(error = %err, ticks = state.report.ticks, "batch aborted");
            return Err(err);
        }

        let report = state.report;
        info!(
            succeeded = report.succeeded,
            dropped = report.dropped.len(),
            skipped = report.skipped,
            attempts = report.attempts,
            ticks = report.ticks,
            "done"
        );
        Ok(report)
    }

    async fn tick_loop(
        &mut self,
        state: &mut LoopState<F::Record>,
        input: &mut JsonlInput,
        output: &mut JsonlOutput,
        completed: &HashSet<TaskId>,
        poll_interval: Duration,
    ) -> Result<(), SchedulerError> {
        loop {
            tokio::time::sleep(poll_interval).await;
            state.report.ticks += 1;

            self.sweep(state, output).await?;

            let reclaimed = self.policy.reclaim(&mut state.completions, Instant::now());
            if reclaimed > 0 {
                debug!(reclaimed, quota = ?self.policy.snapshot(), "reclaimed quota");
            }

            if state.pending.is_empty() && !input.is_exhausted() {
                self.refill(state, input, completed).await?;
            }

            if state.pending.is_empty() {
                if state.running.is_empty() {
                    return Ok(());
                }
                continue;
            }

            self.admit(state);
        }
    }

    /// Classify every finished attempt.
    async fn sweep(
        &mut self,
        state: &mut LoopState<F::Record>,
        output: &mut JsonlOutput,
    ) -> Result<(), SchedulerError> {
        while let Some(joined) = state.running.try_join_next() {
            let Finished {
                mut record,
                charged,
                outcome,
            } = joined?;
            let task_id = record.task_id();
            let run_id = record.run_id();
            let tick = state.report.ticks;

            match outcome {
                Ok(()) => {
                    record.state_mut().finish_success(now_utc());
                    if record.state_mut().claim_success() {
                        record.on_success()?;
                    }
                    output.append(&record.serialize()?).await?;
                    info!(task_id, run_id, "[success] {}", record.summary());
                    state.report.succeeded += 1;
                    self.record_audit(tick, task_id, run_id, AuditAction::Success);
                }
                Err(err) => {
                    record.state_mut().set_end_time(now_utc());
                    if run_id < self.config.max_task_runs {
                        warn!(task_id, run_id, error = %err, "[error] {}", record.summary());
                        state.pending.push_back(record);
                        self.record_audit(tick, task_id, run_id, AuditAction::Retry);
                    } else {
                        warn!(task_id, run_id, error = %err, "[error] [quit] {}", record.summary());
                        state.report.dropped.push(task_id);
                        self.record_audit(tick, task_id, run_id, AuditAction::Drop);
                    }
                }
            }

            state.completions.push(task_id, charged, Instant::now());
        }
        Ok(())
    }

    /// Read input until one record is pending or the input is exhausted.
    async fn refill(
        &mut self,
        state: &mut LoopState<F::Record>,
        input: &mut JsonlInput,
        completed: &HashSet<TaskId>,
    ) -> Result<(), SchedulerError> {
        while let Some((task_id, line)) = input.next_line().await? {
            if self.config.start_id.is_some_and(|start| task_id < start) {
                continue;
            }
            if self.config.end_id.is_some_and(|end| task_id > end) {
                debug!(task_id, "past end_id, closing input");
                input.exhaust();
                break;
            }
            if completed.contains(&task_id) {
                debug!(task_id, "already in output, skipping");
                state.report.skipped += 1;
                self.record_audit(state.report.ticks, task_id, 0, AuditAction::Skip);
                continue;
            }

            let payload = parse_payload(task_id, &line)?;
            state.pending.push_back(self.factory.build(task_id, payload));
            break;
        }
        Ok(())
    }

    /// Dispatch the head of the pending queue if the policy allows it.
    fn admit(&mut self, state: &mut LoopState<F::Record>) {
        let Some(demand) = state.pending.front().map(|record| record.demand()) else {
            return;
        };
        let tick = state.report.ticks;

        if !self.policy.admit(&demand) {
            // Nothing running or awaiting reclamation: the budget is already
            // whole and still too small for this task.
            if state.running.is_empty() && state.completions.is_empty() {
                if let Some(record) = state.pending.pop_front() {
                    let task_id = record.task_id();
                    warn!(
                        task_id,
                        tokens = demand.tokens,
                        "[error] [quit] {} exceeds the whole quota",
                        record.summary()
                    );
                    state.report.dropped.push(task_id);
                    self.record_audit(tick, task_id, record.run_id(), AuditAction::Drop);
                }
            }
            return;
        }

        let Some(mut record) = state.pending.pop_front() else {
            return;
        };
        let run_id = record.state_mut().begin_attempt(now_utc());
        self.policy.charge(&demand);
        let task_id = record.task_id();
        info!(task_id, run_id, "[run] {}", record.summary());
        self.record_audit(tick, task_id, run_id, AuditAction::Admit);

        let runner = self.runner.clone();
        state.running.spawn(async move {
            let outcome = AssertUnwindSafe(runner.run(&mut record))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(anyhow::anyhow!("runner panicked")));
            Finished {
                record,
                charged: demand,
                outcome,
            }
        });

        state.report.attempts += 1;
        state.report.peak_running = state.report.peak_running.max(state.running.len());
    }

    fn record_audit(&mut self, tick: u64, task_id: TaskId, run_id: u32, action: AuditAction) {
        if let Some(sink) = self.audit.as_mut() {
            sink.record(build_audit_event(tick, task_id, run_id, action));
        }
    }
}
