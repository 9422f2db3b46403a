//! Builders to construct an engine and its quota policy from configuration.

use std::time::Duration;

use crate::config::{EngineConfig, QuotaConfig};
use crate::core::{
    AuditSink, DualBudgetPolicy, Engine, FixedConcurrencyPolicy, FixedRatePolicy, QuotaPolicy,
    RecordFactory, RunReport, SchedulerError, TaskRunner,
};

/// Build the quota policy described by `cfg`.
#[must_use]
pub fn build_policy(cfg: &QuotaConfig) -> Box<dyn QuotaPolicy> {
    match *cfg {
        QuotaConfig::FixedRate {
            requests_per_window,
            window_secs,
        } => Box::new(
            FixedRatePolicy::new(requests_per_window).with_window(Duration::from_secs(window_secs)),
        ),
        QuotaConfig::DualBudget {
            requests_per_window,
            tokens_per_window,
            window_secs,
        } => Box::new(
            DualBudgetPolicy::new(requests_per_window, tokens_per_window)
                .with_window(Duration::from_secs(window_secs)),
        ),
        QuotaConfig::FixedConcurrency { max_in_flight } => {
            Box::new(FixedConcurrencyPolicy::new(max_in_flight))
        }
    }
}

/// Validating builder for [`Engine`].
pub struct EngineBuilder<F, X>
where
    F: RecordFactory,
    X: TaskRunner<F::Record>,
{
    config: EngineConfig,
    factory: F,
    runner: X,
    policy: Option<Box<dyn QuotaPolicy>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl<F, X> EngineBuilder<F, X>
where
    F: RecordFactory,
    X: TaskRunner<F::Record>,
{
    /// Start from a config, a record factory and a runner.
    pub fn new(config: EngineConfig, factory: F, runner: X) -> Self {
        Self {
            config,
            factory,
            runner,
            policy: None,
            audit: None,
        }
    }

    /// Use `policy` instead of the one described by `config.quota`.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn QuotaPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Configuration being built.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate the config and assemble the engine.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if validation fails.
    pub fn build(self) -> Result<Engine<F, X>, SchedulerError> {
        self.config
            .validate()
            .map_err(SchedulerError::InvalidConfig)?;

        let policy = self
            .policy
            .unwrap_or_else(|| build_policy(&self.config.quota));
        let engine = Engine::new(self.config, self.factory, self.runner, policy);
        Ok(match self.audit {
            Some(audit) => engine.with_audit(audit),
            None => engine,
        })
    }
}

/// Build an engine from `config` and run it to completion.
///
/// # Errors
///
/// Any error from [`EngineBuilder::build`] or [`Engine::run`].
pub async fn run_batch<F, X>(
    config: EngineConfig,
    factory: F,
    runner: X,
) -> Result<RunReport, SchedulerError>
where
    F: RecordFactory,
    X: TaskRunner<F::Record>,
{
    EngineBuilder::new(config, factory, runner).build()?.run().await
}
