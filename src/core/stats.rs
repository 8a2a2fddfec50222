//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of scheduler activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Number of live worker threads.
    pub worker_count: usize,

    /// Tasks currently in the ready queue.
    pub ready_tasks: usize,

    /// Tasks currently in the waiting set.
    pub waiting_tasks: usize,

    /// Tasks accepted by `enqueue`.
    pub submitted_tasks: u64,

    /// Tasks executed by worker threads.
    pub worker_executions: u64,

    /// Tasks executed by callers inside `await_completed`.
    pub helper_executions: u64,

    /// Tasks moved from the waiting set to the ready queue.
    pub promoted_tasks: u64,

    /// `enqueue` calls ignored because the task was not waiting or already queued.
    pub rejected_submissions: u64,

    /// Tasks whose body panicked.
    pub panicked_tasks: u64,
}

impl SchedulerStats {
    /// Total tasks executed on any thread.
    #[must_use]
    pub const fn completed_tasks(&self) -> u64 {
        self.worker_executions + self.helper_executions
    }
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub submitted_tasks: AtomicU64,
    pub worker_executions: AtomicU64,
    pub helper_executions: AtomicU64,
    pub promoted_tasks: AtomicU64,
    pub rejected_submissions: AtomicU64,
    pub panicked_tasks: AtomicU64,
}

impl SchedulerCounters {
    /// Snapshot the counters; queue lengths and worker count come from the caller.
    pub fn snapshot(&self, worker_count: usize, ready_tasks: usize, waiting_tasks: usize) -> SchedulerStats {
        SchedulerStats {
            worker_count,
            ready_tasks,
            waiting_tasks,
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            worker_executions: self.worker_executions.load(Ordering::Relaxed),
            helper_executions: self.helper_executions.load(Ordering::Relaxed),
            promoted_tasks: self.promoted_tasks.load(Ordering::Relaxed),
            rejected_submissions: self.rejected_submissions.load(Ordering::Relaxed),
            panicked_tasks: self.panicked_tasks.load(Ordering::Relaxed),
        }
    }
}
