//! Per-task completion signal.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A single-shot signal that any number of threads can block on.
///
/// The signal starts unset and is set exactly once by whichever thread
/// finishes the owning task. Waiters use a `parking_lot::Condvar`, so a
/// blocked thread consumes no CPU time.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    done: Mutex<bool>,
    condvar: Condvar,
}

impl CompletionSignal {
    /// Create an unset signal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            done: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Set the signal and wake every waiter. Later calls are no-ops.
    pub fn notify(&self) {
        let mut done = self.done.lock();
        if !*done {
            *done = true;
            self.condvar.notify_all();
        }
    }

    /// Whether the signal has been set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.done.lock()
    }

    /// Block until the signal is set.
    pub fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.condvar.wait(&mut done);
        }
    }

    /// Block for at most `timeout`; returns whether the signal is set.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut done = self.done.lock();
        if *done {
            return true;
        }
        // wait_while_for re-checks the predicate after spurious wake-ups
        // and keeps the remaining deadline.
        self.condvar
            .wait_while_for(&mut done, |done| !*done, timeout);
        *done
    }
}
