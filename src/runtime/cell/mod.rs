//! Deferred cells and the feed/settle protocol
//!
//! A [`Deferred`] is a single-assignment container. It is eventually settled
//! with exactly one [`Outcome`], and consumers may attach continuations before
//! or after that happens.
//!
//! # Architecture
//!
//! Every node in a chain is the same kind of cell, moving through two phases:
//!
//! 1. **Feed** - the upstream cell hands over its outcome. The cell moves from
//!    `AwaitingInput` to `Settling` and runs its reaction (handler pair or
//!    cleanup), if it has one.
//! 2. **Settle** - the cell gets its own outcome and moves to `Resolved` or
//!    `Rejected`. It then drains its two waiter lists: *feed waiters* (the
//!    continuations attached with `then`/`catch`/`finally`) are fed, and
//!    *settle waiters* (continuations whose handler returned this cell) are
//!    settled with the same outcome.
//!
//! Root containers skip the feed phase; see [`crate::runtime::root`].
//!
//! # Ownership
//!
//! A cell owns its pending waiters until it drains them. Waiters never point
//! back at the cell they wait on, so a chain is a tree owned from its root; the
//! producer's settle callbacks keep the root alive.
//!
//! No `RefCell` borrow is held while a handler or waiter runs, so handlers may
//! re-enter any cell, including the one notifying them.
//!
//! Waiter notifications are queued per thread and delivered by the outermost
//! settle, breadth-first, so propagation never nests one stack frame group per
//! link. A settle made from inside a handler therefore updates its own cell at
//! once, but its waiters hear about it only after that handler returns.
//! Dropping a pending chain is iterative too.

pub mod id;
mod propagate;
pub mod reaction;
pub mod state;

pub use id::{CellId, CellIdGenerator};
pub use reaction::{EffectOutput, HandlerOutput, HandlerResult};
pub use state::{CellKind, CellState, Outcome, TransitionError};

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::runtime::value::Value;
use crate::util::config;
use id::CELL_IDS;
use propagate::Notify;
use reaction::Reaction;

type Waiters = SmallVec<[Deferred; 2]>;

struct CellInner {
    id: CellId,
    kind: CellKind,
    state: CellState,
    /// Written once, on `Settling -> Resolved | Rejected`.
    outcome: Option<Outcome>,
    /// Taken on `AwaitingInput -> Settling`.
    reaction: Option<Reaction>,
    feed_waiters: Waiters,
    settle_waiters: Waiters,
}

impl Drop for CellInner {
    fn drop(&mut self) {
        if self.feed_waiters.is_empty() && self.settle_waiters.is_empty() {
            return;
        }
        // Unlink uniquely owned waiters one level at a time instead of
        // letting `Rc` drop recurse down the chain
        let mut orphans: Vec<Deferred> = self.feed_waiters.drain(..).collect();
        orphans.extend(self.settle_waiters.drain(..));
        while let Some(Deferred { inner }) = orphans.pop() {
            if let Ok(cell) = Rc::try_unwrap(inner) {
                let mut cell = cell.into_inner();
                orphans.extend(cell.feed_waiters.drain(..));
                orphans.extend(cell.settle_waiters.drain(..));
            }
        }
    }
}

/// Handle to a deferred cell.
///
/// Cloning the handle is cheap and shares the cell. Handles are `!Send`: a
/// chain lives on one thread, driven by that thread's
/// [`scheduler`](crate::runtime::scheduler).
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<CellInner>>,
}

impl fmt::Debug for Deferred {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(cell) => f
                .debug_struct("Deferred")
                .field("id", &cell.id)
                .field("kind", &cell.kind)
                .field("state", &cell.state)
                .field("outcome", &cell.outcome)
                .finish(),
            Err(_) => f.debug_struct("Deferred").finish_non_exhaustive(),
        }
    }
}

fn report(err: TransitionError) -> TransitionError {
    if config::warn_on_misuse() {
        warn!("[!] {}", err);
    }
    err
}

impl Deferred {
    pub(crate) fn with_state(
        kind: CellKind,
        state: CellState,
        reaction: Option<Reaction>,
    ) -> Self {
        let id = CELL_IDS.generate();
        if config::trace_transitions() {
            trace!("[-] {} created as {} ({})", id, kind, state);
        }
        Self {
            inner: Rc::new(RefCell::new(CellInner {
                id,
                kind,
                state,
                outcome: None,
                reaction,
                feed_waiters: SmallVec::new(),
                settle_waiters: SmallVec::new(),
            })),
        }
    }

    /// A bare cell with no reaction.
    ///
    /// Feeding it only moves it to `Settling`; its owner is expected to settle
    /// it explicitly afterwards.
    pub fn relay() -> Self {
        Self::with_state(CellKind::Relay, CellState::AwaitingInput, None)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Diagnostic id.
    pub fn id(&self) -> CellId {
        self.inner.borrow().id
    }

    /// Role of this cell.
    pub fn kind(&self) -> CellKind {
        self.inner.borrow().kind
    }

    /// Current state.
    pub fn state(&self) -> CellState {
        self.inner.borrow().state
    }

    /// The settled outcome, once there is one.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.borrow().outcome.clone()
    }

    /// The resolved value, if the cell resolved.
    pub fn value(&self) -> Option<Value> {
        self.outcome().and_then(|o| o.value().cloned())
    }

    /// The rejection error, if the cell rejected.
    pub fn error(&self) -> Option<Value> {
        self.outcome().and_then(|o| o.error().cloned())
    }

    /// Whether the cell has no outcome yet.
    pub fn is_pending(&self) -> bool {
        !self.is_settled()
    }

    /// Whether the cell has an outcome.
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().state.is_settled()
    }

    /// Continuations waiting to be fed.
    pub fn feed_waiter_count(&self) -> usize {
        self.inner.borrow().feed_waiters.len()
    }

    /// Continuations waiting to mirror this cell's outcome.
    pub fn settle_waiter_count(&self) -> usize {
        self.inner.borrow().settle_waiters.len()
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(
        &self,
        other: &Deferred,
    ) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Feed phase
    // ------------------------------------------------------------------

    /// Feed a value from upstream.
    ///
    /// Only valid while `AwaitingInput`; otherwise a no-op returning
    /// [`TransitionError::NotAwaitingInput`].
    pub fn feed_value(
        &self,
        value: impl Into<Value>,
    ) -> Result<(), TransitionError> {
        self.feed(Outcome::Value(value.into()))
    }

    /// Feed an error from upstream.
    pub fn feed_error(
        &self,
        error: impl Into<Value>,
    ) -> Result<(), TransitionError> {
        self.feed(Outcome::Error(error.into()))
    }

    pub(crate) fn feed(
        &self,
        input: Outcome,
    ) -> Result<(), TransitionError> {
        let (id, reaction) = {
            let mut cell = self.inner.borrow_mut();
            if cell.state != CellState::AwaitingInput {
                return Err(report(TransitionError::NotAwaitingInput {
                    id: cell.id,
                    state: cell.state,
                }));
            }
            cell.state = CellState::Settling;
            (cell.id, cell.reaction.take())
        };

        if config::trace_transitions() {
            trace!("[-] {} fed {}", id, input);
        }
        if let Some(reaction) = reaction {
            reaction.react(self, input);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Settle phase
    // ------------------------------------------------------------------

    /// Settle with a value.
    ///
    /// Only valid while `Settling`; otherwise a no-op returning
    /// [`TransitionError::NotSettling`].
    pub fn settle_value(
        &self,
        value: impl Into<Value>,
    ) -> Result<(), TransitionError> {
        self.settle(Outcome::Value(value.into()))
    }

    /// Settle with an error.
    pub fn settle_error(
        &self,
        error: impl Into<Value>,
    ) -> Result<(), TransitionError> {
        self.settle(Outcome::Error(error.into()))
    }

    pub(crate) fn settle(
        &self,
        outcome: Outcome,
    ) -> Result<(), TransitionError> {
        let (id, feed_waiters, settle_waiters) = {
            let mut cell = self.inner.borrow_mut();
            if cell.state != CellState::Settling {
                return Err(report(TransitionError::NotSettling {
                    id: cell.id,
                    state: cell.state,
                }));
            }
            cell.state = outcome.settled_state();
            cell.outcome = Some(outcome.clone());
            (
                cell.id,
                mem::take(&mut cell.feed_waiters),
                mem::take(&mut cell.settle_waiters),
            )
        };

        if config::trace_transitions() {
            trace!(
                "[-] {} settled {} ({} to feed, {} to settle)",
                id,
                outcome,
                feed_waiters.len(),
                settle_waiters.len()
            );
        }
        if outcome.is_error() && feed_waiters.is_empty() && settle_waiters.is_empty() {
            debug!("{} rejected with no dependents: {}", id, outcome);
        }

        let feeds = feed_waiters
            .into_iter()
            .map(|waiter| Notify::Feed(waiter, outcome.clone()));
        let settles = settle_waiters
            .into_iter()
            .map(|waiter| Notify::Settle(waiter, outcome.clone()));
        propagate::propagate(feeds.chain(settles));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Feed `waiter` with this cell's outcome once there is one.
    ///
    /// If this cell is already settled, `waiter` is fed before this call
    /// returns and the result is that feed's result. Called from inside a
    /// handler, the feed is queued instead and the result is `Ok`.
    pub fn register_feed_waiter(
        &self,
        waiter: Deferred,
    ) -> Result<(), TransitionError> {
        let outcome = {
            let mut cell = self.inner.borrow_mut();
            match cell.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    cell.feed_waiters.push(waiter);
                    return Ok(());
                }
            }
        };
        propagate::deliver(Notify::Feed(waiter, outcome))
    }

    /// Settle `waiter` with this cell's outcome once there is one.
    ///
    /// If this cell is already settled, `waiter` is settled before this call
    /// returns, or queued when called from inside a handler.
    pub fn register_settle_waiter(
        &self,
        waiter: Deferred,
    ) -> Result<(), TransitionError> {
        let outcome = {
            let mut cell = self.inner.borrow_mut();
            match cell.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    cell.settle_waiters.push(waiter);
                    return Ok(());
                }
            }
        };
        propagate::deliver(Notify::Settle(waiter, outcome))
    }

    /// Mirror `source`'s outcome once it settles.
    pub(crate) fn follow(
        &self,
        source: Deferred,
    ) {
        let _ = source.register_settle_waiter(self.clone());
    }

    // ------------------------------------------------------------------
    // Chaining
    // ------------------------------------------------------------------

    fn attach(
        &self,
        kind: CellKind,
        reaction: Reaction,
    ) -> Deferred {
        let node = Self::with_state(kind, CellState::AwaitingInput, Some(reaction));
        if config::trace_transitions() {
            trace!("[-] {} waits on {}", node.id(), self.id());
        }
        let _ = self.register_feed_waiter(node.clone());
        node
    }

    /// Continue with `on_value` once this cell resolves.
    ///
    /// Rejections skip the handler and pass through to the returned cell.
    pub fn then<F, R>(
        &self,
        on_value: F,
    ) -> Deferred
    where
        F: FnOnce(Value) -> R + 'static,
        R: HandlerOutput,
    {
        self.attach(
            CellKind::Continuation,
            Reaction::Continuation {
                on_value: Some(Box::new(move |v| on_value(v).into_handler_result())),
                on_error: None,
            },
        )
    }

    /// Continue with `on_value` or `on_error`, whichever path this cell takes.
    ///
    /// A fault raised by `on_value` is not seen by `on_error` of the same node.
    pub fn then_catch<F, R, G, S>(
        &self,
        on_value: F,
        on_error: G,
    ) -> Deferred
    where
        F: FnOnce(Value) -> R + 'static,
        R: HandlerOutput,
        G: FnOnce(Value) -> S + 'static,
        S: HandlerOutput,
    {
        self.attach(
            CellKind::Continuation,
            Reaction::Continuation {
                on_value: Some(Box::new(move |v| on_value(v).into_handler_result())),
                on_error: Some(Box::new(move |e| on_error(e).into_handler_result())),
            },
        )
    }

    /// Handle a rejection; values pass through untouched.
    ///
    /// Whatever `on_error` returns becomes the returned cell's outcome, so a
    /// chain recovers by returning a value and keeps failing by returning `Err`.
    pub fn catch<G, S>(
        &self,
        on_error: G,
    ) -> Deferred
    where
        G: FnOnce(Value) -> S + 'static,
        S: HandlerOutput,
    {
        self.attach(
            CellKind::Continuation,
            Reaction::Continuation {
                on_value: None,
                on_error: Some(Box::new(move |e| on_error(e).into_handler_result())),
            },
        )
    }

    /// Run `on_done` on either outcome, then pass that outcome on.
    ///
    /// The cleanup cannot change the outcome, except by faulting: a fault
    /// rejects the returned cell instead.
    pub fn finally<F, R>(
        &self,
        on_done: F,
    ) -> Deferred
    where
        F: FnOnce() -> R + 'static,
        R: EffectOutput,
    {
        self.attach(
            CellKind::Finalizer,
            Reaction::Finalizer {
                on_done: Some(Box::new(move || on_done().into_effect_result())),
            },
        )
    }
}

#[cfg(test)]
mod tests;
