//! Waiting on tasks from async code.
//!
//! The completion signal is a blocking primitive, so the wait is moved onto
//! tokio's blocking thread pool with `spawn_blocking`. These are pure waits:
//! they never run the task themselves, so the task must be enqueued on a
//! scheduler with running workers (or be driven elsewhere).
//!
//! The blocking side waits in short slices and gives up once the returned
//! future has been dropped, so cancelling a wait (for example with
//! `tokio::time::timeout`) frees its blocking thread within one slice and
//! never holds up runtime shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{SchedulerError, TaskHandle};

/// Longest a blocking waiter sleeps before checking for cancellation.
const WAIT_SLICE: Duration = Duration::from_millis(20);

/// Marks the wait abandoned when the owning future is dropped.
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Wait for `task` until it completes, `deadline` passes, or the wait is
/// abandoned. Returns whether the task completed.
fn wait_in_slices(task: &TaskHandle, deadline: Option<Instant>, abandoned: &AtomicBool) -> bool {
    loop {
        if task.completed() {
            return true;
        }
        if abandoned.load(Ordering::Acquire) {
            return false;
        }
        let slice = match deadline {
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return false;
                }
                left.min(WAIT_SLICE)
            }
            None => WAIT_SLICE,
        };
        if task.await_timeout(slice) {
            return true;
        }
    }
}

async fn wait_blocking(task: TaskHandle, deadline: Option<Instant>) -> Result<bool, SchedulerError> {
    if task.completed() {
        return Ok(true);
    }
    let abandoned = Arc::new(AtomicBool::new(false));
    let _guard = AbandonOnDrop(Arc::clone(&abandoned));
    tokio::task::spawn_blocking(move || wait_in_slices(&task, deadline, &abandoned))
        .await
        .map_err(|e| SchedulerError::Join(e.to_string()))
}

/// Wait until `task` has completed.
///
/// Dropping the future before the task completes releases the blocking
/// thread within a few milliseconds.
///
/// # Errors
///
/// Returns `SchedulerError::Join` if the blocking wait could not be joined.
pub async fn await_completed_async(task: TaskHandle) -> Result<(), SchedulerError> {
    wait_blocking(task, None).await.map(|_| ())
}

/// Wait at most `timeout` for `task`; returns whether it completed.
///
/// # Errors
///
/// Returns `SchedulerError::Join` if the blocking wait could not be joined.
pub async fn await_timeout_async(task: TaskHandle, timeout: Duration) -> Result<bool, SchedulerError> {
    wait_blocking(task, Some(Instant::now() + timeout)).await
}
