//! Scheduler unit tests
//!
//! Task ids, queue ordering and the local executor's virtual clock


use crate::runtime::scheduler::{Task, TaskId, TaskIdGenerator, TaskState};
use std::time::Duration;

#[cfg(test)]
mod task_id_tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId(5).to_string(), "Task(5)");
    }

    #[test]
    fn test_task_id_conversions() {
        let id = TaskId::from(9);
        assert_eq!(id.inner(), 9);
        assert_eq!(usize::from(id), 9);
    }

    #[test]
    fn test_generator_is_sequential() {
        let mut ids = TaskIdGenerator::new();
        assert_eq!(ids.next(), TaskId(0));
        assert_eq!(ids.next(), TaskId(1));
        ids.reset(100);
        assert_eq!(ids.next(), TaskId(100));
    }
}

#[cfg(test)]
mod task_tests {
    use super::*;

    #[test]
    fn test_task_new() {
        let task = Task::new(TaskId(1), Duration::from_millis(5), || {});
        assert_eq!(task.id(), TaskId(1));
        assert_eq!(task.due(), Duration::from_millis(5));
        assert_eq!(task.state(), TaskState::Queued);
        assert!(task.name().is_none());
    }

    #[test]
    fn test_task_with_name() {
        let task = Task::new(TaskId(1), Duration::ZERO, || {}).with_name("settle");
        assert_eq!(task.name(), Some("settle"));
        assert!(format!("{:?}", task).contains("settle"));
    }

    #[test]
    fn test_take_executor_once() {
        let mut task = Task::new(TaskId(1), Duration::ZERO, || {});
        assert!(task.take_executor().is_some());
        assert!(task.take_executor().is_none());
    }
}
