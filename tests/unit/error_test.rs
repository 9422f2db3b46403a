//! Tests for error types

use prometheus_batch_runner::core::SchedulerError;
use prometheus_batch_runner::infra::parse_payload;

#[test]
fn test_input_parse_error_names_line() {
    let err = parse_payload(7, "{oops").unwrap_err();
    assert!(format!("{err}").starts_with("malformed input at line 7: "));
}

#[test]
fn test_resume_scan_error_names_line() {
    let source = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
    let err = SchedulerError::ResumeScan { line: 3, source };
    assert!(format!("{err}").starts_with("malformed output at line 3: "));
}

#[test]
fn test_artifact_error() {
    let err = SchedulerError::Artifact("2 vectors for 3 texts".to_string());
    assert_eq!(format!("{err}"), "artifact error: 2 vectors for 3 texts");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("max_task_runs must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: max_task_runs must be greater than 0"
    );
}

#[test]
fn test_io_error_converts() {
    fn open_missing() -> Result<(), SchedulerError> {
        std::fs::File::open("/definitely/not/here.jsonl")?;
        Ok(())
    }
    let err = open_missing().unwrap_err();
    assert!(matches!(err, SchedulerError::Io(_)));
    assert!(format!("{err}").starts_with("i/o error: "));
}
