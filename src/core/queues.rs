//! Ready queue, waiting set and the dependency resolver.
//!
//! Both collections live in one [`Queues`] value that the scheduler keeps
//! behind a single `parking_lot::Mutex`; every method here assumes the caller
//! holds that lock.

use std::collections::VecDeque;

use super::task::TaskHandle;

/// Where [`Queues::admit`] placed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// All dependencies were complete; the task is at the back of the ready queue.
    Ready,
    /// At least one dependency is outstanding; the task is in the waiting set.
    Waiting,
}

/// Shared queue state guarded by the scheduler's lock.
#[derive(Debug, Default)]
pub struct Queues {
    ready: VecDeque<TaskHandle>,
    waiting: Vec<TaskHandle>,
    /// Set by `release_pool`; workers exit once they find no ready work.
    pub(crate) shutdown: bool,
}

impl Queues {
    /// Create empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a newly enqueued task in the ready queue or the waiting set.
    ///
    /// Dependencies are checked while the lock is held, so a dependency that
    /// completes concurrently is either seen here or seen by the resolver
    /// pass that follows its completion.
    pub fn admit(&mut self, task: TaskHandle) -> Placement {
        if task.dependencies_completed() {
            self.ready.push_back(task);
            Placement::Ready
        } else {
            self.waiting.push(task);
            Placement::Waiting
        }
    }

    /// Take the task at the front of the ready queue.
    pub fn pop_ready(&mut self) -> Option<TaskHandle> {
        let task = self.ready.pop_front()?;
        task.clear_queued();
        Some(task)
    }

    /// Scan the waiting set once and move every task whose dependencies have
    /// all completed to the back of the ready queue, keeping their relative
    /// order. Tasks already run by a helper thread are dropped instead.
    ///
    /// Returns the number of tasks promoted.
    pub fn promote_ready(&mut self) -> usize {
        let scanned = std::mem::take(&mut self.waiting);
        self.waiting.reserve(scanned.len());
        let mut promoted = 0;
        for task in scanned {
            if task.completed() {
                task.clear_queued();
            } else if task.dependencies_completed() {
                self.ready.push_back(task);
                promoted += 1;
            } else {
                self.waiting.push(task);
            }
        }
        promoted
    }

    /// Whether the ready queue has work.
    #[must_use]
    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Number of tasks in the ready queue.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Number of tasks in the waiting set.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Drop every queued task. Their state is untouched, so they may be
    /// enqueued again later.
    pub fn clear(&mut self) -> usize {
        let dropped = self.ready.len() + self.waiting.len();
        for task in self.ready.drain(..).chain(self.waiting.drain(..)) {
            task.clear_queued();
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Task;
    use std::sync::Arc;

    fn queued(task: TaskHandle) -> TaskHandle {
        assert!(task.mark_queued());
        task
    }

    #[test]
    fn test_admit_without_dependencies_is_ready() {
        let mut queues = Queues::new();
        let task = queued(Task::new(|| {}));
        assert_eq!(queues.admit(task), Placement::Ready);
        assert_eq!(queues.ready_len(), 1);
        assert_eq!(queues.waiting_len(), 0);
    }

    #[test]
    fn test_admit_with_pending_dependency_waits() {
        let mut queues = Queues::new();
        let dep = Task::new(|| {});
        let task = queued(Task::with_dependencies(|| {}, [dep]));
        assert_eq!(queues.admit(task), Placement::Waiting);
        assert!(!queues.has_ready());
        assert_eq!(queues.waiting_len(), 1);
    }

    #[test]
    fn test_promote_appends_to_back() {
        let mut queues = Queues::new();
        let dep = Task::new(|| {});
        let dependent = queued(Task::with_dependencies(|| {}, [dep.clone()]));
        let early = queued(Task::new(|| {}));

        queues.admit(Arc::clone(&dependent));
        queues.admit(Arc::clone(&early));

        assert_eq!(queues.promote_ready(), 0);
        assert!(dep.try_run());
        assert_eq!(queues.promote_ready(), 1);

        // Promotion time, not enqueue time, decides the position
        assert_eq!(queues.pop_ready().map(|t| t.id()), Some(early.id()));
        assert_eq!(queues.pop_ready().map(|t| t.id()), Some(dependent.id()));
        assert!(queues.pop_ready().is_none());
    }

    #[test]
    fn test_promote_keeps_waiting_order() {
        let mut queues = Queues::new();
        let dep = Task::new(|| {});
        let first = queued(Task::with_dependencies(|| {}, [dep.clone()]));
        let blocked = queued(Task::with_dependencies(|| {}, [Task::new(|| {})]));
        let second = queued(Task::with_dependencies(|| {}, [dep.clone()]));

        queues.admit(Arc::clone(&first));
        queues.admit(Arc::clone(&blocked));
        queues.admit(Arc::clone(&second));
        assert!(dep.try_run());

        assert_eq!(queues.promote_ready(), 2);
        assert_eq!(queues.waiting_len(), 1);
        assert_eq!(queues.pop_ready().map(|t| t.id()), Some(first.id()));
        assert_eq!(queues.pop_ready().map(|t| t.id()), Some(second.id()));
    }

    #[test]
    fn test_promote_drops_completed_tasks() {
        let mut queues = Queues::new();
        let dep = Task::new(|| {});
        let task = queued(Task::with_dependencies(|| {}, [dep.clone()]));
        queues.admit(Arc::clone(&task));

        assert!(dep.try_run());
        // A helper ran the task before the resolver got to it
        assert!(task.try_run());

        assert_eq!(queues.promote_ready(), 0);
        assert_eq!(queues.waiting_len(), 0);
        assert!(!queues.has_ready());
        assert!(task.mark_queued());
    }

    #[test]
    fn test_promote_large_waiting_set_keeps_order() {
        let mut queues = Queues::new();
        let gate_a = Task::new(|| {});
        let gate_b = Task::new(|| {});

        // Even indices wait on gate_a, odd ones on gate_b
        let tasks: Vec<_> = (0..10_000)
            .map(|i| {
                let gate = if i % 2 == 0 { &gate_a } else { &gate_b };
                queued(Task::with_dependencies(|| {}, [Arc::clone(gate)]))
            })
            .collect();
        for task in &tasks {
            queues.admit(Arc::clone(task));
        }

        assert!(gate_a.try_run());
        assert_eq!(queues.promote_ready(), 5_000);
        assert_eq!(queues.waiting_len(), 5_000);

        assert!(gate_b.try_run());
        assert_eq!(queues.promote_ready(), 5_000);
        assert_eq!(queues.waiting_len(), 0);

        let expected = tasks
            .iter()
            .step_by(2)
            .chain(tasks.iter().skip(1).step_by(2))
            .map(|t| t.id());
        let popped = std::iter::from_fn(|| queues.pop_ready()).map(|t| t.id());
        assert!(popped.eq(expected));
    }

    #[test]
    fn test_pop_ready_clears_queued_flag() {
        let mut queues = Queues::new();
        let task = queued(Task::new(|| {}));
        queues.admit(Arc::clone(&task));
        let popped = queues.pop_ready().unwrap();
        assert!(popped.mark_queued());
    }

    #[test]
    fn test_clear() {
        let mut queues = Queues::new();
        let ready = queued(Task::new(|| {}));
        let waiting = queued(Task::with_dependencies(|| {}, [Task::new(|| {})]));
        queues.admit(Arc::clone(&ready));
        queues.admit(Arc::clone(&waiting));

        assert_eq!(queues.clear(), 2);
        assert_eq!(queues.ready_len(), 0);
        assert_eq!(queues.waiting_len(), 0);
        assert!(ready.mark_queued());
        assert!(waiting.mark_queued());
    }
}
