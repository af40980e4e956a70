//! Join combinator integration tests

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pledge::{all, scheduler, CellState, Deferred, HandlerResult, Value};
use proptest::prelude::*;

fn settle_after(
    ms: u64,
    outcome: Result<Value, Value>,
) -> Deferred {
    Deferred::new(move |resolve, reject| {
        scheduler::schedule_after(Duration::from_millis(ms), move || match outcome {
            Ok(value) => resolve.resolve(value),
            Err(error) => reject.reject(error),
        });
    })
}

#[test]
fn test_all_keeps_input_order() {
    scheduler::reset();
    let joined = all(vec![
        settle_after(3000, Ok(1.into())),
        settle_after(1000, Ok(2.into())),
        settle_after(2000, Ok(3.into())),
    ]);

    scheduler::run_until(Duration::from_millis(2500));
    assert!(joined.is_pending());

    scheduler::run();
    assert_eq!(joined.value(), Some(Value::list([1, 2, 3])));
    assert_eq!(scheduler::now(), Duration::from_millis(3000));
}

#[test]
fn test_all_mixed_plain_values() {
    scheduler::reset();
    let joined = Deferred::all(vec![
        HandlerResult::from(settle_after(1000, Ok(4.into()))),
        5.into(),
        6.into(),
    ]);

    assert!(joined.is_pending());
    scheduler::run();
    assert_eq!(joined.value(), Some(Value::list([4, 5, 6])));
}

#[test]
fn test_all_plain_only_resolves_inline() {
    let joined = all(vec![HandlerResult::from("a"), "b".into()]);
    assert_eq!(joined.value(), Some(Value::list(["a", "b"])));
}

#[test]
fn test_all_empty_resolves_with_empty_list() {
    let joined = all(Vec::<Deferred>::new());
    assert_eq!(joined.value(), Some(Value::list(Vec::<Value>::new())));
}

#[test]
fn test_all_rejects_once_with_first_error() {
    scheduler::reset();
    let caught = Rc::new(Cell::new(0));
    let counter = caught.clone();

    let joined = all(vec![
        settle_after(1000, Err("E".into())),
        settle_after(2000, Ok(2.into())),
        settle_after(3000, Err("later".into())),
    ]);
    let handled = joined.catch(move |e| {
        counter.set(counter.get() + 1);
        e
    });

    scheduler::run();
    assert_eq!(joined.state(), CellState::Rejected);
    assert_eq!(joined.error(), Some(Value::string("E")));
    assert_eq!(handled.value(), Some(Value::string("E")));
    assert_eq!(caught.get(), 1);
}

#[test]
fn test_all_rejection_beats_pending_values() {
    scheduler::reset();
    let joined = all(vec![
        settle_after(5000, Ok(1.into())),
        settle_after(10, Err("fast failure".into())),
    ]);

    scheduler::run_until(Duration::from_millis(100));
    assert_eq!(joined.error(), Some(Value::string("fast failure")));

    scheduler::run();
    assert_eq!(joined.error(), Some(Value::string("fast failure")));
}

#[test]
fn test_all_of_already_settled_members() {
    scheduler::reset();
    let first = Deferred::resolve(1);
    let second = Deferred::resolve(2);
    scheduler::run();

    let joined = all([&first, &second]);
    assert_eq!(joined.value(), Some(Value::list([1, 2])));
}

#[test]
fn test_all_result_feeds_chain() {
    scheduler::reset();
    let total = all(vec![
        settle_after(30, Ok(1.into())),
        settle_after(20, Ok(2.into())),
        settle_after(10, Ok(3.into())),
    ])
    .then(|v| {
        v.as_slice()
            .map(|items| items.iter().filter_map(Value::to_int).sum::<i64>())
            .unwrap_or(0)
    });

    scheduler::run();
    assert_eq!(total.value(), Some(Value::Int(6)));
}

proptest! {
    #[test]
    fn prop_all_orders_by_position(delays in prop::collection::vec(0u64..50, 1..8)) {
        scheduler::reset();
        let members: Vec<Deferred> = delays
            .iter()
            .enumerate()
            .map(|(i, &ms)| settle_after(ms, Ok(Value::Int(i as i64))))
            .collect();
        let joined = all(members);

        scheduler::run();
        let expected: Vec<Value> = (0..delays.len()).map(|i| Value::Int(i as i64)).collect();
        prop_assert_eq!(joined.value(), Some(Value::List(expected)));
    }

    #[test]
    fn prop_all_rejects_with_earliest_error(
        members in prop::collection::vec((0u64..50, any::<bool>()), 1..8)
    ) {
        scheduler::reset();
        let cells: Vec<Deferred> = members
            .iter()
            .enumerate()
            .map(|(i, &(ms, fails))| {
                let outcome = if fails {
                    Err(Value::Int(i as i64))
                } else {
                    Ok(Value::Int(i as i64))
                };
                settle_after(ms, outcome)
            })
            .collect();

        let caught = Rc::new(Cell::new(0));
        let counter = caught.clone();
        let joined = all(cells);
        joined.catch(move |e| {
            counter.set(counter.get() + 1);
            e
        });
        scheduler::run();

        // Equal delays fire in scheduling order, which is input order
        let first_failure = members
            .iter()
            .enumerate()
            .filter(|(_, member)| member.1)
            .min_by_key(|(i, member)| (member.0, *i))
            .map(|(i, _)| Value::Int(i as i64));

        match first_failure {
            Some(error) => {
                prop_assert_eq!(joined.error(), Some(error));
                prop_assert_eq!(caught.get(), 1);
            }
            None => {
                prop_assert_eq!(joined.state(), CellState::Resolved);
                prop_assert_eq!(caught.get(), 0);
            }
        }
    }
}
