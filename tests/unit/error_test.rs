//! Tests for error types

use prometheus_task_scheduler::config::SchedulerConfig;
use prometheus_task_scheduler::core::{Scheduler, SchedulerError};
use std::error::Error;

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = SchedulerError::Spawn {
        worker_id: 2,
        source: std::io::Error::other("out of threads"),
    };
    assert_eq!(format!("{}", err), "failed to spawn worker 2: out of threads");
    assert!(err.source().is_some());
}

#[test]
fn test_join_error() {
    let err = SchedulerError::Join("task cancelled".to_string());
    assert_eq!(format!("{}", err), "join error: task cancelled");
}

#[test]
fn test_scheduler_surfaces_invalid_config() {
    let result = Scheduler::start(SchedulerConfig::new().with_thread_name_prefix(""));
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}
