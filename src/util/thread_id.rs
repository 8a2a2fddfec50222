//! Sequential thread identities for diagnostics.
//!
//! Native thread ids are opaque and large; log prefixes and profiler tracks
//! read better with small integers. The first time a thread asks for its id
//! it gets the next free integer, starting at 0, and keeps it for the rest of
//! the process. None of this affects scheduling.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

/// Maps native thread ids to sequential integers.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    ids: Mutex<HashMap<ThreadId, usize>>,
}

impl ThreadRegistry {
    /// Create an empty registry; the first thread to register gets 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequential id of the calling thread, assigned on first use.
    pub fn current(&self) -> usize {
        self.id_of(thread::current().id())
    }

    /// Sequential id for `thread`, assigned on first use.
    pub fn id_of(&self, thread: ThreadId) -> usize {
        let mut ids = self.ids.lock();
        let next = ids.len();
        *ids.entry(thread).or_insert(next)
    }

    /// Number of threads seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    /// Whether no thread has registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn global_registry() -> &'static ThreadRegistry {
    static REGISTRY: OnceLock<ThreadRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ThreadRegistry::new)
}

/// Sequential id of the calling thread in the process-wide registry.
///
/// ```
/// use prometheus_task_scheduler::util::current_thread_id;
///
/// let id = current_thread_id();
/// assert_eq!(current_thread_id(), id);
/// ```
pub fn current_thread_id() -> usize {
    global_registry().current()
}
