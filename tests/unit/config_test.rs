//! Tests for configuration validation

use prometheus_task_scheduler::config::{default_worker_count, SchedulerConfig};

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig::new()
        .with_worker_count(4)
        .with_thread_stack_size(256 * 1024)
        .with_thread_name_prefix("loader");
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_worker_count() {
    let invalid = SchedulerConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_stack_size() {
    let invalid = SchedulerConfig::new().with_thread_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_prefix() {
    let invalid = SchedulerConfig::new().with_thread_name_prefix("  ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "worker_count": 5,
        "thread_name_prefix": "io"
    }"#;

    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.worker_count, Some(5));
    assert_eq!(cfg.thread_stack_size, None);
    assert_eq!(cfg.thread_name_prefix, "io");
}

#[test]
fn test_scheduler_config_from_json_defaults() {
    let cfg = SchedulerConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, SchedulerConfig::default());
    assert_eq!(cfg.resolved_worker_count(), default_worker_count());
}

#[test]
fn test_scheduler_config_from_json_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_scheduler_config_json_round_trip() {
    let cfg = SchedulerConfig::new().with_worker_count(3);
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(SchedulerConfig::from_json_str(&json).unwrap(), cfg);
}
