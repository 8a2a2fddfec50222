//! Tests for utility functions

use prometheus_task_scheduler::util::{current_thread_id, ThreadRegistry};
use std::collections::HashSet;
use std::thread;

#[test]
fn test_registry_assigns_sequential_ids() {
    let registry = ThreadRegistry::new();
    assert!(registry.is_empty());

    let first = registry.current();
    assert_eq!(first, 0);
    assert_eq!(registry.current(), first);

    let other = thread::spawn(|| thread::current().id()).join().unwrap();
    assert_eq!(registry.id_of(other), 1);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_current_thread_id_is_stable_and_distinct() {
    let here = current_thread_id();
    assert_eq!(current_thread_id(), here);

    let ids: HashSet<usize> = (0..4)
        .map(|_| thread::spawn(current_thread_id))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert_eq!(ids.len(), 4);
    assert!(!ids.contains(&here));
}

#[test]
fn test_init_tracing_is_idempotent() {
    prometheus_task_scheduler::util::init_tracing();
    prometheus_task_scheduler::util::telemetry::init_tracing_with_filter("debug");
    tracing::info!("telemetry initialized");
}
