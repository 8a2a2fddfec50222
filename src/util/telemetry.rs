//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "prometheus_task_scheduler=info";

/// Install a default fmt subscriber unless the application already set one.
///
/// Honors `RUST_LOG`; falls back to [`DEFAULT_FILTER`]. Worker thread names
/// are included in every line so scheduler events can be attributed to the
/// thread that produced them.
pub fn init_tracing() {
    init_tracing_with_filter(DEFAULT_FILTER);
}

/// Like [`init_tracing`] with an explicit fallback filter directive.
pub fn init_tracing_with_filter(fallback: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
