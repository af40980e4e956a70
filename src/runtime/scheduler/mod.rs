//! Cooperative scheduler for deferred settlement
//!
//! This module provides the "run later" primitive used by
//! [`Deferred::resolve`](crate::Deferred::resolve) and
//! [`Deferred::reject`](crate::Deferred::reject), and by producers that want to
//! settle a root container on a later turn.
//!
//! Each thread owns one [`LocalExecutor`]. Time is virtual: `run` jumps the
//! clock straight to the next due task instead of sleeping, so a chain with a
//! one-second delay completes instantly while still observing the ordering it
//! would have in real time.
//!
//! # Ordering
//!
//! A task runs after the current synchronous code and after every task already
//! queued for the same instant. Tasks with a longer delay run later.

pub mod queue;
pub mod task;

pub use queue::TaskQueue;
pub use task::{Task, TaskId, TaskIdGenerator, TaskState};

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::runtime::value::Value;
use crate::util::config;

/// Counters for one `run` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Tasks that ran to completion.
    pub executed: usize,
    /// Tasks that panicked.
    pub failed: usize,
    /// Virtual time that passed during the run.
    pub elapsed: Duration,
    /// Whether the run stopped because the task budget was spent.
    pub exhausted: bool,
}

/// Single-threaded executor with a virtual clock.
#[derive(Debug, Default)]
pub struct LocalExecutor {
    /// Pending tasks.
    queue: RefCell<TaskQueue>,
    /// Current virtual instant.
    now: Cell<Duration>,
    /// Task ID generator.
    task_ids: RefCell<TaskIdGenerator>,
}

impl LocalExecutor {
    /// Create an executor with an empty queue at instant zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `f` to run `delay` after the current instant.
    pub fn schedule_after<F>(
        &self,
        name: Option<&str>,
        delay: Duration,
        f: F,
    ) -> TaskId
    where
        F: FnOnce() + 'static,
    {
        let id = self.task_ids.borrow_mut().next();
        let mut task = Task::new(id, self.now.get() + delay, f);
        if let Some(name) = name {
            task = task.with_name(name);
        }
        if config::trace_transitions() {
            trace!("[sched] queue {} due at {:?}", id, task.due());
        }
        self.queue.borrow_mut().push(task);
        id
    }

    /// Run the earliest task, advancing the clock to its due instant.
    ///
    /// Returns `None` when the queue is empty, otherwise whether the task
    /// completed without panicking.
    pub fn run_next(&self) -> Option<bool> {
        // The queue borrow must end before the task runs: tasks schedule more tasks.
        let mut task = self.queue.borrow_mut().pop_front()?;
        if task.due() > self.now.get() {
            self.now.set(task.due());
        }

        let executor = task.take_executor()?;
        task.set_state(TaskState::Running);
        match panic::catch_unwind(AssertUnwindSafe(executor)) {
            Ok(()) => {
                task.set_state(TaskState::Finished);
                Some(true)
            }
            Err(payload) => {
                task.set_state(TaskState::Failed);
                let reason = Value::from_panic(payload);
                warn!(
                    "{} ({}) panicked: {}",
                    task.id(),
                    task.name().unwrap_or("anonymous"),
                    reason
                );
                Some(false)
            }
        }
    }

    /// Run tasks until the queue is empty, the next task is due after
    /// `deadline`, or the task budget is spent.
    pub fn run_until(
        &self,
        deadline: Option<Duration>,
    ) -> RunStats {
        let started = self.now.get();
        let budget = config::task_budget();
        let mut stats = RunStats::default();

        loop {
            let Some(due) = self.queue.borrow().next_due() else {
                break;
            };
            if deadline.is_some_and(|limit| due > limit) {
                break;
            }
            if stats.executed + stats.failed >= budget {
                warn!(
                    "scheduler stopped after {} tasks with {} still queued",
                    budget,
                    self.pending()
                );
                stats.exhausted = true;
                break;
            }
            match self.run_next() {
                Some(true) => stats.executed += 1,
                Some(false) => stats.failed += 1,
                None => break,
            }
        }

        if let Some(limit) = deadline {
            if limit > self.now.get() {
                self.now.set(limit);
            }
        }
        // A task may have reset the clock
        stats.elapsed = self.now.get().saturating_sub(started);
        debug!(
            "scheduler ran {} tasks ({} failed) over {:?}",
            stats.executed, stats.failed, stats.elapsed
        );
        stats
    }

    /// Current virtual instant.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of queued tasks.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Drop all queued tasks and rewind the clock to zero.
    pub fn reset(&self) {
        self.queue.borrow_mut().clear();
        self.now.set(Duration::ZERO);
        self.task_ids.borrow_mut().reset(0);
    }
}

thread_local! {
    /// The executor serving the current thread.
    static EXECUTOR: LocalExecutor = LocalExecutor::new();
}

/// Run `f` against the current thread's executor.
pub fn with_executor<R>(f: impl FnOnce(&LocalExecutor) -> R) -> R {
    EXECUTOR.with(f)
}

/// Queue `f` for the next turn.
pub fn schedule<F>(f: F) -> TaskId
where
    F: FnOnce() + 'static,
{
    with_executor(|ex| ex.schedule_after(None, Duration::ZERO, f))
}

/// Queue `f` to run after `delay` of virtual time.
pub fn schedule_after<F>(
    delay: Duration,
    f: F,
) -> TaskId
where
    F: FnOnce() + 'static,
{
    with_executor(|ex| ex.schedule_after(None, delay, f))
}

/// Queue a named task; the name shows up in diagnostics.
pub fn schedule_named<F>(
    name: &str,
    delay: Duration,
    f: F,
) -> TaskId
where
    F: FnOnce() + 'static,
{
    with_executor(|ex| ex.schedule_after(Some(name), delay, f))
}

/// Run until the queue is empty.
pub fn run() -> RunStats {
    with_executor(|ex| ex.run_until(None))
}

/// Run every task due at or before `deadline`, then set the clock to it.
pub fn run_until(deadline: Duration) -> RunStats {
    with_executor(|ex| ex.run_until(Some(deadline)))
}

/// Run the earliest queued task.
pub fn run_next() -> bool {
    with_executor(|ex| ex.run_next()).is_some()
}

/// Current virtual instant.
pub fn now() -> Duration {
    with_executor(|ex| ex.now())
}

/// Number of queued tasks.
pub fn pending() -> usize {
    with_executor(|ex| ex.pending())
}

/// Drop all queued tasks and rewind the clock.
pub fn reset() {
    with_executor(|ex| ex.reset())
}

#[cfg(test)]
mod tests;
