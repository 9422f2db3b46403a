//! Tests for builder modules

use std::time::Duration;

use async_trait::async_trait;
use prometheus_batch_runner::builders::{build_policy, EngineBuilder};
use prometheus_batch_runner::config::{EngineConfig, QuotaConfig};
use prometheus_batch_runner::core::{
    AppResult, BasicRecord, BasicRecordFactory, FixedConcurrencyPolicy, QuotaPolicy, ReclaimQueue,
    SchedulerError, TaskRunner,
};
use prometheus_batch_runner::util::ResourceDemand;

#[derive(Clone)]
struct NoopRunner;

#[async_trait]
impl TaskRunner<BasicRecord> for NoopRunner {
    async fn run(&self, _record: &mut BasicRecord) -> AppResult<()> {
        Ok(())
    }
}

fn config(quota: QuotaConfig) -> EngineConfig {
    EngineConfig::new("in.jsonl", "out.jsonl", quota)
}

#[test]
fn test_engine_builder_keeps_config() {
    let builder = EngineBuilder::new(
        config(QuotaConfig::FixedConcurrency { max_in_flight: 2 }).with_max_task_runs(4),
        BasicRecordFactory,
        NoopRunner,
    );
    assert_eq!(builder.config().max_task_runs, 4);

    let engine = builder.build().unwrap();
    assert_eq!(engine.config().max_task_runs, 4);
}

#[test]
fn test_engine_builder_rejects_invalid_config() {
    let result = EngineBuilder::new(
        config(QuotaConfig::FixedConcurrency { max_in_flight: 0 }),
        BasicRecordFactory,
        NoopRunner,
    )
    .build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_engine_builder_accepts_custom_policy() {
    let engine = EngineBuilder::new(
        config(QuotaConfig::FixedConcurrency { max_in_flight: 2 }),
        BasicRecordFactory,
        NoopRunner,
    )
    .with_policy(Box::new(FixedConcurrencyPolicy::new(16)))
    .build();
    assert!(engine.is_ok());
}

#[test]
fn test_build_policy_uses_configured_window() {
    let mut policy = build_policy(&QuotaConfig::FixedRate {
        requests_per_window: 1,
        window_secs: 2,
    });
    assert_eq!(policy.name(), "fixed_rate");

    let start = tokio::time::Instant::now();
    let mut queue = ReclaimQueue::new();
    policy.charge(&ResourceDemand::none());
    queue.push(1, ResourceDemand::none(), start);

    assert_eq!(policy.reclaim(&mut queue, start + Duration::from_secs(2)), 0);
    assert_eq!(policy.reclaim(&mut queue, start + Duration::from_secs(3)), 1);
}
