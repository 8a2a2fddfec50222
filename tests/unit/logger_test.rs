//! Tests for the buffered console logger

use prometheus_task_scheduler::config::SchedulerConfig;
use prometheus_task_scheduler::core::Scheduler;
use prometheus_task_scheduler::infra::BufferedLogger;
use std::sync::Arc;
use tracing::Level;

fn lines(logger: &BufferedLogger<Vec<u8>>) -> Vec<String> {
    logger.with_sink(|sink| {
        String::from_utf8_lossy(sink)
            .lines()
            .map(str::to_owned)
            .collect()
    })
}

#[test]
fn test_logger_writes_through_workers() {
    let scheduler = Arc::new(Scheduler::start(SchedulerConfig::new().with_worker_count(2)).unwrap());
    let logger = BufferedLogger::new(Arc::clone(&scheduler), Vec::new());

    for i in 0..20 {
        logger.log(Level::INFO, format_args!("asset {i} loaded"));
    }
    logger.flush().unwrap();

    let out = lines(&logger);
    assert_eq!(out.len(), 20);
    assert!(out[0].ends_with("asset 0 loaded"));
    assert!(out[19].ends_with("asset 19 loaded"));
    assert_eq!(logger.pending_lines(), 0);
    assert!(logger.flushes_scheduled() >= 1);
}

#[test]
fn test_logger_without_workers_flushes_on_caller() {
    let scheduler = Arc::new(Scheduler::new(SchedulerConfig::new().with_worker_count(2)).unwrap());
    let logger = BufferedLogger::new(Arc::clone(&scheduler), Vec::new());

    logger.log(Level::WARN, "disk almost full");
    logger.log(Level::ERROR, "disk full");
    // The first flush task never completes, so only one is ever scheduled
    assert_eq!(logger.flushes_scheduled(), 1);
    assert_eq!(logger.pending_lines(), 2);

    logger.flush().unwrap();
    let out = lines(&logger);
    assert_eq!(out.len(), 2);
    assert!(out[0].contains("WARN  disk almost full"));
    assert!(out[1].contains("ERROR disk full"));
}
