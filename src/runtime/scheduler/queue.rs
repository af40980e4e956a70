//! Task queue for the scheduler
//!
//! Tasks are ordered by due instant, then by id (scheduling order).

use std::collections::BTreeMap;
use std::time::Duration;

use super::task::{Task, TaskId};

/// A time-ordered task queue.
///
/// Two tasks due at the same instant come out in the order they were pushed.
#[derive(Debug, Default)]
pub struct TaskQueue {
    inner: BTreeMap<(Duration, TaskId), Task>,
}

impl TaskQueue {
    /// Create a new empty task queue.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Insert a task at its due position.
    #[inline]
    pub fn push(
        &mut self,
        task: Task,
    ) {
        self.inner.insert((task.due(), task.id()), task);
    }

    /// Pop the earliest task.
    #[inline]
    pub fn pop_front(&mut self) -> Option<Task> {
        self.inner.pop_first().map(|(_, task)| task)
    }

    /// Due instant of the earliest task.
    #[inline]
    pub fn next_due(&self) -> Option<Duration> {
        self.inner.keys().next().map(|(due, _)| *due)
    }

    /// Get the number of tasks in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every queued task without running it.
    #[inline]
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
