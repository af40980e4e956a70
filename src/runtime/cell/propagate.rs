//! Waiter notification queue
//!
//! Settling a cell notifies its waiters, which may settle and notify theirs,
//! and so on down the chain. Notifications go through a thread-local FIFO
//! queue drained by the outermost call, so a chain of any length propagates at
//! constant stack depth.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::state::{Outcome, TransitionError};
use super::Deferred;

/// One pending delivery to a waiter.
pub(crate) enum Notify {
    /// Feed the waiter (a `then`/`catch`/`finally` node or relay).
    Feed(Deferred, Outcome),
    /// Settle the waiter with the same outcome (flattening).
    Settle(Deferred, Outcome),
}

impl Notify {
    fn deliver(self) -> Result<(), TransitionError> {
        match self {
            Notify::Feed(cell, outcome) => cell.feed(outcome),
            Notify::Settle(cell, outcome) => cell.settle(outcome),
        }
    }
}

thread_local! {
    static PENDING: RefCell<VecDeque<Notify>> = const { RefCell::new(VecDeque::new()) };
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the thread as draining; cleared on drop, even while unwinding.
struct DrainGuard;

impl DrainGuard {
    fn enter() -> Option<DrainGuard> {
        if DRAINING.with(|d| d.replace(true)) {
            None
        } else {
            Some(DrainGuard)
        }
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        DRAINING.with(|d| d.set(false));
    }
}

fn drain() {
    loop {
        // The queue borrow ends before delivery: delivery queues more
        let next = PENDING.with(|q| q.borrow_mut().pop_front());
        match next {
            Some(notify) => {
                let _ = notify.deliver();
            }
            None => break,
        }
    }
}

/// Queue `batch`, then drain unless an outer call is already draining.
pub(crate) fn propagate(batch: impl IntoIterator<Item = Notify>) {
    PENDING.with(|q| q.borrow_mut().extend(batch));
    if let Some(_guard) = DrainGuard::enter() {
        drain();
    }
}

/// Deliver `notify` now and return its result, unless an outer call is
/// draining; then it is queued behind the deliveries already pending and
/// reported as `Ok`.
pub(crate) fn deliver(notify: Notify) -> Result<(), TransitionError> {
    match DrainGuard::enter() {
        Some(_guard) => {
            let result = notify.deliver();
            drain();
            result
        }
        None => {
            PENDING.with(|q| q.borrow_mut().push_back(notify));
            Ok(())
        }
    }
}
