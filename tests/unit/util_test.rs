//! Tests for utility functions

use chrono::{TimeZone, Utc};
use prometheus_batch_runner::util::{
    epoch, init_tracing, to_iso8601, ResourceDemand, TaskId, DEFAULT_FILTER,
};

#[test]
fn test_resource_demand() {
    assert_eq!(ResourceDemand::none().tokens, 0);
    assert_eq!(ResourceDemand::tokens(42).tokens, 42);
    assert_eq!(ResourceDemand::default(), ResourceDemand::none());
}

#[test]
fn test_iso8601_has_micros_and_z() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    assert_eq!(to_iso8601(&ts), "2024-03-09T14:05:07.000000Z");
    assert_eq!(to_iso8601(&epoch()), "1970-01-01T00:00:00.000000Z");
}

#[test]
fn test_task_id() {
    let id: TaskId = 12345;
    assert_eq!(id, 12345);
}

#[test]
fn test_init_tracing_is_idempotent() {
    assert!(DEFAULT_FILTER.starts_with("prometheus_batch_runner="));
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}
