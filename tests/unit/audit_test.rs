//! Tests for audit sink

use prometheus_batch_runner::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(4, 17, 2, AuditAction::Retry);
    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].tick, 4);
    assert_eq!(events[0].task_id, 17);
    assert_eq!(events[0].run_id, 2);
    assert_eq!(events[0].action, AuditAction::Retry);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, 1, 1, AuditAction::Admit));
    sink.record(build_audit_event(2, 2, 1, AuditAction::Admit));
    sink.record(build_audit_event(3, 3, 1, AuditAction::Admit));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, 2); // First one popped
    assert_eq!(events[1].task_id, 3);
}

#[test]
fn test_events_with_filters_by_action() {
    let mut sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event(1, 1, 1, AuditAction::Admit));
    sink.record(build_audit_event(2, 1, 1, AuditAction::Success));
    sink.record(build_audit_event(2, 2, 0, AuditAction::Skip));
    sink.record(build_audit_event(3, 3, 1, AuditAction::Admit));

    let admitted: Vec<u64> = sink
        .events_with(AuditAction::Admit)
        .iter()
        .map(|event| event.task_id)
        .collect();
    assert_eq!(admitted, vec![1, 3]);
    assert!(sink.events_with(AuditAction::Drop).is_empty());
}

#[test]
fn test_clones_share_buffer() {
    let observer = InMemoryAuditSink::new(10);
    let mut writer = observer.clone();
    writer.record(build_audit_event(1, 9, 1, AuditAction::Drop));

    assert_eq!(observer.events().len(), 1);
    assert_eq!(observer.events()[0].task_id, 9);
}

#[test]
fn test_build_audit_event_stamps_time() {
    let event = build_audit_event(1, 1, 1, AuditAction::Success);
    assert!(event.created_at.timestamp() > 0);
}
