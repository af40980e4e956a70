//! Error propagation integration tests
//!
//! Rejections, handler faults, cleanup and protocol misuse.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use pledge::{scheduler, CellState, Deferred, TransitionError, Value};

fn fails_later(
    ms: u64,
    error: &str,
) -> Deferred {
    let error = Value::string(error);
    Deferred::new(move |_, reject| {
        scheduler::schedule_after(Duration::from_millis(ms), move || reject.reject(error));
    })
}

#[test]
fn test_setup_error_reaches_catch() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();

    Deferred::new(|_, _| Err::<(), _>("Whoops1!"))
        .then(|v| v)
        .then(|v| v)
        .catch(move |e| log.borrow_mut().push(e));

    assert_eq!(*seen.borrow(), vec![Value::string("Whoops1!")]);
}

#[test]
fn test_scheduled_rejection_reaches_catch() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();

    fails_later(1000, "Whoops2!")
        .then(|_| -> Value { unreachable!("value path on a rejection") })
        .catch(move |e| log.borrow_mut().push(e));

    scheduler::run();
    assert_eq!(*seen.borrow(), vec![Value::string("Whoops2!")]);
}

#[test]
fn test_handler_fault_mid_chain() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();

    Deferred::resolve(1)
        .then(|v| v.to_int().unwrap_or(0) + 1)
        .then(|v| Err::<Value, _>(Value::list([Value::string("bad"), v])))
        .then(|v| v)
        .catch(move |e| log.borrow_mut().push(e));

    scheduler::run();
    assert_eq!(
        *seen.borrow(),
        vec![Value::list([Value::string("bad"), Value::Int(2)])]
    );
}

#[test]
fn test_recovered_chain_continues() {
    scheduler::reset();
    let out = fails_later(5, "down")
        .catch(|_| "fallback")
        .then(|v| v.as_str().map(str::len).unwrap_or(0) as i64);

    scheduler::run();
    assert_eq!(out.value(), Some(Value::Int(8)));
}

#[test]
fn test_uncaught_rejection_is_not_a_fault() {
    scheduler::reset();
    let tail = fails_later(5, "ignored").then(|v| v).then(|v| v);

    let stats = scheduler::run();
    assert_eq!(stats.failed, 0);
    assert_eq!(tail.state(), CellState::Rejected);
}

#[test]
fn test_finally_on_both_paths() {
    scheduler::reset();
    let cleanups = Rc::new(Cell::new(0));

    let ok_count = cleanups.clone();
    let ok = Deferred::resolve("ok").finally(move || ok_count.set(ok_count.get() + 1));
    let err_count = cleanups.clone();
    let err = fails_later(5, "err").finally(move || err_count.set(err_count.get() + 1));

    scheduler::run();
    assert_eq!(cleanups.get(), 2);
    assert_eq!(ok.value(), Some(Value::string("ok")));
    assert_eq!(err.error(), Some(Value::string("err")));
}

#[test]
fn test_finally_fault_replaces_value() {
    scheduler::reset();
    let out = Deferred::resolve(1)
        .finally(|| "x".parse::<i64>().map(|_| ()))
        .catch(|e| e);

    scheduler::run();
    let message = out.value().and_then(|v| v.as_str().map(str::to_owned));
    assert!(message.is_some_and(|m| m.contains("invalid digit")));
}

#[test]
fn test_task_panic_is_isolated() {
    scheduler::reset();
    let root = Deferred::new(|resolve, _| {
        scheduler::schedule(|| panic!("producer task panicked"));
        scheduler::schedule_after(Duration::from_millis(1), move || resolve.resolve(1));
    });

    let stats = scheduler::run();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.executed, 1);
    assert_eq!(root.value(), Some(Value::Int(1)));
}

#[test]
fn test_misuse_reports_but_keeps_outcome() {
    let cell = Deferred::relay();
    cell.feed_value(()).unwrap();
    cell.settle_value("first").unwrap();

    match cell.settle_error("second") {
        Err(TransitionError::NotSettling { id, state }) => {
            assert_eq!(id, cell.id());
            assert_eq!(state, CellState::Resolved);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(cell.value(), Some(Value::string("first")));
}
