//! Join combinator: wait for every member, fail on the first error
//!
//! `all(items)` returns a root container that:
//! - resolves with a [`Value::List`] of every member's value, in input order,
//!   however the members' settlements interleave in time
//! - rejects with the first member error; later errors and later values are
//!   ignored
//!
//! Items are anything a handler could return: plain values count as already
//! resolved members.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::cell::{Deferred, HandlerResult};
use crate::runtime::root::{Rejecter, Resolver};
use crate::runtime::value::Value;

/// State shared by the continuations of one `all` call.
#[derive(Debug)]
struct JoinState {
    /// One slot per input position; `None` until that member resolves.
    slots: Vec<Option<Value>>,
    /// Members that have not resolved yet.
    remaining: usize,
    /// Set once the first member error has been forwarded.
    failed: bool,
}

impl JoinState {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            remaining: len,
            failed: false,
        }
    }

    /// Record a member value; returns the results once every slot is filled.
    fn fill(
        &mut self,
        index: usize,
        value: Value,
    ) -> Option<Vec<Value>> {
        self.slots[index] = Some(value);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 && !self.failed {
            Some(
                self.slots
                    .iter_mut()
                    .map(|slot| slot.take().unwrap_or_default())
                    .collect(),
            )
        } else {
            None
        }
    }

    /// Returns `true` for the first failure only.
    fn fail(&mut self) -> bool {
        !std::mem::replace(&mut self.failed, true)
    }
}

fn fill(
    state: &RefCell<JoinState>,
    index: usize,
    value: Value,
    resolve: &Resolver,
) {
    // Release the borrow before resolving: resolution runs downstream handlers
    let done = state.borrow_mut().fill(index, value);
    if let Some(results) = done {
        resolve.resolve(Value::List(results));
    }
}

fn watch(
    member: &Deferred,
    index: usize,
    state: &Rc<RefCell<JoinState>>,
    resolve: &Resolver,
    reject: &Rejecter,
) {
    let on_value_state = state.clone();
    let resolve = resolve.clone();
    let on_error_state = state.clone();
    let reject = reject.clone();

    member
        .then(move |value| fill(&on_value_state, index, value, &resolve))
        .catch(move |error| {
            if on_error_state.borrow_mut().fail() {
                reject.reject(error);
            }
        });
}

/// Wait for every item; see the [module docs](self).
///
/// An empty input resolves at once with an empty list.
///
/// # Example
///
/// ```
/// use pledge::{all, scheduler, Deferred, HandlerResult, Value};
///
/// let joined = all(vec![
///     HandlerResult::from(Deferred::resolve(4)),
///     5.into(),
///     6.into(),
/// ]);
/// scheduler::run();
/// assert_eq!(joined.value(), Some(Value::list([4, 5, 6])));
/// ```
pub fn all<I>(items: I) -> Deferred
where
    I: IntoIterator,
    I::Item: Into<HandlerResult>,
{
    let items: Vec<HandlerResult> = items.into_iter().map(Into::into).collect();

    Deferred::new(move |resolve, reject| {
        if items.is_empty() {
            resolve.resolve(Value::List(Vec::new()));
            return;
        }

        let state = Rc::new(RefCell::new(JoinState::new(items.len())));
        for (index, item) in items.into_iter().enumerate() {
            match item {
                HandlerResult::Plain(value) => fill(&state, index, value, &resolve),
                HandlerResult::Chainable(member) => watch(&member, index, &state, &resolve, &reject),
            }
        }
    })
}

impl Deferred {
    /// Join `items`; same as [`all`].
    pub fn all<I>(items: I) -> Deferred
    where
        I: IntoIterator,
        I::Item: Into<HandlerResult>,
    {
        all(items)
    }
}
