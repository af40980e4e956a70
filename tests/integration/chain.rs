//! Chain integration tests
//!
//! Producers settle from scheduled tasks; the scheduler's virtual clock
//! orders everything.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pledge::{scheduler, Deferred, Value};

fn later(
    ms: u64,
    value: impl Into<Value>,
) -> Deferred {
    let value = value.into();
    Deferred::new(move |resolve, _| {
        scheduler::schedule_after(Duration::from_millis(ms), move || resolve.resolve(value));
    })
}

#[test]
fn test_single_then() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();

    later(1000, 1).then(move |v| log.borrow_mut().push(v));

    assert!(seen.borrow().is_empty());
    let stats = scheduler::run();
    assert_eq!(*seen.borrow(), vec![Value::Int(1)]);
    assert_eq!(stats.executed, 1);
    assert_eq!(stats.elapsed, Duration::from_millis(1000));
}

#[test]
fn test_chain_threads_values() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();

    later(1000, 1)
        .then(|v| v.to_int().unwrap_or(0) + 1)
        .then(|v| v.to_int().unwrap_or(0) + 1)
        .then(move |v| log.borrow_mut().push(v));

    scheduler::run();
    assert_eq!(*seen.borrow(), vec![Value::Int(3)]);
}

#[test]
fn test_fanout_from_one_root() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let root = later(1000, 1);

    for offset in [10, 20] {
        let log = seen.clone();
        root.then(move |v| log.borrow_mut().push(Value::Int(v.to_int().unwrap_or(0) + offset)));
    }

    scheduler::run();
    assert_eq!(*seen.borrow(), vec![Value::Int(11), Value::Int(21)]);
}

#[test]
fn test_nested_deferred_waits() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let clock = seen.clone();

    later(1000, 1)
        .then(|v| later(1000, v.to_int().unwrap_or(0) * 2))
        .then(move |v| {
            clock.borrow_mut().push(Value::Int(scheduler::now().as_millis() as i64));
            log.borrow_mut().push(v);
        });

    // Only the outer producer has fired
    scheduler::run_until(Duration::from_millis(1500));
    assert!(seen.borrow().is_empty());

    scheduler::run();
    assert_eq!(*seen.borrow(), vec![Value::Int(2000), Value::Int(2)]);
}

#[test]
fn test_settled_cell_reused_later() {
    scheduler::reset();
    let root = later(10, "ready");
    scheduler::run();
    assert_eq!(root.value(), Some(Value::string("ready")));

    // Late attachment fires without another scheduler turn
    let out = root.then(|v| Value::list([v.clone(), v]));
    assert_eq!(
        out.value(),
        Some(Value::list([Value::string("ready"), Value::string("ready")]))
    );
}

#[test]
fn test_resolve_factory_order() {
    scheduler::reset();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for n in 0..3 {
        let log = seen.clone();
        Deferred::resolve(n).then(move |v| log.borrow_mut().push(v));
    }
    assert!(seen.borrow().is_empty());

    scheduler::run();
    assert_eq!(
        *seen.borrow(),
        vec![Value::Int(0), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn test_long_chain_from_scheduled_root() {
    scheduler::reset();
    let mut tail = later(1, 0);
    for _ in 0..10_000 {
        tail = tail.then(|v| v.to_int().unwrap_or(0) + 1);
    }

    scheduler::run();
    assert_eq!(tail.value(), Some(Value::Int(10_000)));
}
