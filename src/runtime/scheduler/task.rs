//! Task definitions for the scheduler.
//!
//! This module defines the deferred callbacks queued on the local executor.

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

/// Unique task identifier.
///
/// Ids are handed out in scheduling order, so they double as the tie-breaker
/// between tasks due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl From<usize> for TaskId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl From<TaskId> for usize {
    fn from(val: TaskId) -> Self {
        val.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Sequential task id generator.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    next_id: usize,
}

impl TaskIdGenerator {
    /// Create a generator starting at zero.
    #[inline]
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Hand out the next id.
    #[inline]
    pub fn next(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Reset the generator to start from the given value.
    #[inline]
    pub fn reset(
        &mut self,
        value: usize,
    ) {
        self.next_id = value;
    }
}

/// Task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Task is waiting in the queue.
    Queued,
    /// Task is currently executing.
    Running,
    /// Task has completed successfully.
    Finished,
    /// Task panicked.
    Failed,
}

/// A callback scheduled for a later turn.
pub struct Task {
    /// Unique task ID.
    id: TaskId,
    /// Task name for debugging.
    name: Option<String>,
    /// Virtual instant at which the task becomes runnable.
    due: Duration,
    /// Current state.
    state: Cell<TaskState>,
    /// The actual work to execute.
    executor: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for Task {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("due", &self.due)
            .field("state", &self.state())
            .finish()
    }
}

impl Task {
    /// Create a new task with the given ID, due instant and executor.
    pub fn new<F>(
        id: TaskId,
        due: Duration,
        executor: F,
    ) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            id,
            name: None,
            due,
            state: Cell::new(TaskState::Queued),
            executor: Some(Box::new(executor)),
        }
    }

    /// Attach a debug name.
    pub fn with_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the task ID.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Get the task name, if any.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the due instant.
    #[inline]
    pub fn due(&self) -> Duration {
        self.due
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    /// Set the current state.
    #[inline]
    pub fn set_state(
        &self,
        state: TaskState,
    ) {
        self.state.set(state);
    }

    /// Take the executor out; `None` once the task has run.
    #[inline]
    pub fn take_executor(&mut self) -> Option<Box<dyn FnOnce()>> {
        self.executor.take()
    }
}
