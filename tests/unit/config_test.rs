//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_batch_runner::config::{EngineConfig, QuotaConfig};

fn base() -> EngineConfig {
    EngineConfig::new(
        "input.jsonl",
        "output.jsonl",
        QuotaConfig::FixedRate {
            requests_per_window: 5,
            window_secs: 60,
        },
    )
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_engine_config_defaults() {
    let cfg = base();
    assert_eq!(cfg.max_task_runs, 1);
    assert_eq!(cfg.start_id, None);
    assert_eq!(cfg.end_id, None);
    assert!(!cfg.rewrite_output);
    assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_engine_config_invalid_max_task_runs() {
    assert!(base().with_max_task_runs(0).validate().is_err());
}

#[test]
fn test_engine_config_invalid_range() {
    assert!(base().with_range(Some(5), Some(4)).validate().is_err());
    assert!(base().with_range(Some(4), Some(4)).validate().is_ok());
    assert!(base().with_range(None, Some(1)).validate().is_ok());
}

#[test]
fn test_engine_config_same_input_and_output() {
    let cfg = EngineConfig::new(
        "tasks.jsonl",
        "tasks.jsonl",
        QuotaConfig::FixedConcurrency { max_in_flight: 2 },
    );
    assert!(cfg.validate().is_err());
}

#[test]
fn test_engine_config_invalid_poll_interval() {
    assert!(base().with_poll_interval(Duration::ZERO).validate().is_err());
    assert_eq!(
        base().with_poll_interval(Duration::from_millis(250)).poll_interval_ms,
        250
    );
}

#[test]
fn test_quota_config_rejects_zero_budgets() {
    let zero_rate = QuotaConfig::FixedRate {
        requests_per_window: 0,
        window_secs: 60,
    };
    let zero_window = QuotaConfig::FixedRate {
        requests_per_window: 5,
        window_secs: 0,
    };
    let zero_tokens = QuotaConfig::DualBudget {
        requests_per_window: 5,
        tokens_per_window: 0,
        window_secs: 60,
    };
    let zero_slots = QuotaConfig::FixedConcurrency { max_in_flight: 0 };

    for quota in [zero_rate, zero_window, zero_tokens, zero_slots] {
        assert!(quota.validate().is_err(), "{quota:?}");
    }
}

#[test]
fn test_from_json_str_applies_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{
            "input_path": "in.jsonl",
            "output_path": "out.jsonl",
            "quota": {"kind": "dual_budget", "requests_per_window": 500, "tokens_per_window": 200000}
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.max_task_runs, 1);
    assert_eq!(cfg.poll_interval_ms, 1);
    assert_eq!(
        cfg.quota,
        QuotaConfig::DualBudget {
            requests_per_window: 500,
            tokens_per_window: 200_000,
            window_secs: 60,
        }
    );
}

#[test]
fn test_from_json_str_rejects_invalid() {
    let err = EngineConfig::from_json_str(
        r#"{"input_path": "a", "output_path": "b", "quota": {"kind": "fixed_concurrency", "max_in_flight": 0}}"#,
    )
    .unwrap_err();
    assert!(err.contains("max_in_flight"));

    assert!(EngineConfig::from_json_str("{").unwrap_err().starts_with("parse error"));
}

#[test]
fn test_config_serde_round_trip() {
    let cfg = base().with_max_task_runs(3).with_range(Some(2), Some(9));
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains(r#""kind":"fixed_rate""#));
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_from_lookup_reads_batch_vars() {
    let cfg = EngineConfig::from_lookup(lookup(&[
        ("BATCH_INPUT_FILE", "data/in.jsonl"),
        ("BATCH_OUTPUT_FILE", "data/out.jsonl"),
        ("BATCH_QUOTA", r#"{"kind": "fixed_concurrency", "max_in_flight": 8}"#),
        ("BATCH_MAX_TASK_RUNS", "3"),
        ("BATCH_START_ID", "10"),
        ("BATCH_END_ID", " 20 "),
        ("BATCH_REWRITE_OUTPUT", "yes"),
        ("BATCH_POLL_INTERVAL_MS", "5"),
    ]))
    .unwrap();

    assert_eq!(cfg.input_path.to_str(), Some("data/in.jsonl"));
    assert_eq!(cfg.quota, QuotaConfig::FixedConcurrency { max_in_flight: 8 });
    assert_eq!(cfg.max_task_runs, 3);
    assert_eq!(cfg.start_id, Some(10));
    assert_eq!(cfg.end_id, Some(20));
    assert!(cfg.rewrite_output);
    assert_eq!(cfg.poll_interval_ms, 5);
}

#[test]
fn test_from_lookup_reports_missing_and_bad_values() {
    let missing = EngineConfig::from_lookup(lookup(&[(
        "BATCH_QUOTA",
        r#"{"kind": "fixed_concurrency", "max_in_flight": 8}"#,
    )]))
    .unwrap_err();
    assert_eq!(missing, "BATCH_INPUT_FILE is not set");

    let bad_flag = EngineConfig::from_lookup(lookup(&[
        ("BATCH_INPUT_FILE", "in.jsonl"),
        ("BATCH_OUTPUT_FILE", "out.jsonl"),
        ("BATCH_QUOTA", r#"{"kind": "fixed_concurrency", "max_in_flight": 8}"#),
        ("BATCH_REWRITE_OUTPUT", "maybe"),
    ]))
    .unwrap_err();
    assert!(bad_flag.starts_with("BATCH_REWRITE_OUTPUT"));

    let bad_number = EngineConfig::from_lookup(lookup(&[
        ("BATCH_INPUT_FILE", "in.jsonl"),
        ("BATCH_OUTPUT_FILE", "out.jsonl"),
        ("BATCH_QUOTA", r#"{"kind": "fixed_concurrency", "max_in_flight": 8}"#),
        ("BATCH_MAX_TASK_RUNS", "-1"),
    ]))
    .unwrap_err();
    assert!(bad_number.starts_with("BATCH_MAX_TASK_RUNS"));
}
