//! Tests for task records and factories

use std::sync::Arc;

use prometheus_batch_runner::core::{
    BasicRecordFactory, ChatRecordFactory, Payload, RecordFactory, TaskRecord, TokenCounter,
};
use prometheus_batch_runner::util::ResourceDemand;
use serde_json::{json, Value};

fn payload(value: Value) -> Payload {
    value.as_object().cloned().unwrap()
}

/// Counts characters, to show any tokenizer can be plugged in.
struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

#[test]
fn test_basic_record_defaults() {
    let record = BasicRecordFactory.build(12, payload(json!({"a": 1, "b": 2})));
    assert_eq!(record.task_id(), 12);
    assert_eq!(record.run_id(), 0);
    assert_eq!(record.summary(), "task#12 run#0");
    assert_eq!(record.demand(), ResourceDemand::none());
}

#[test]
fn test_serialize_shape() {
    let mut record = BasicRecordFactory.build(3, payload(json!({"a": 2, "b": 3})));
    record
        .state_mut()
        .payload_mut()
        .insert("result".into(), json!(6));

    let line = record.serialize().unwrap();
    assert!(!line.contains('\n'));

    let parsed: Value = serde_json::from_str(&line).unwrap();
    let keys: Vec<&str> = parsed
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys.len(), 4);
    for key in ["task_id", "data", "start_time", "end_time"] {
        assert!(keys.contains(&key), "missing {key}");
    }
    assert_eq!(parsed["data"], json!({"a": 2, "b": 3, "result": 6}));
}

#[test]
fn test_chat_factory_uses_injected_counter() {
    let factory = ChatRecordFactory::new(Arc::new(CharCounter));
    let record = factory.build(1, payload(json!({"text_in": "hello"})));
    assert_eq!(record.in_tokens(), 5);
    assert_eq!(record.demand(), ResourceDemand::tokens(5));
}

#[test]
fn test_chat_non_string_text_in_is_ignored() {
    let factory = ChatRecordFactory::new(Arc::new(CharCounter));
    let record = factory.build(1, payload(json!({"text_in": ["a", "b"]})));
    assert_eq!(record.in_tokens(), 0);
    assert_eq!(record.state().payload()["text_out_list"], json!([]));
}
