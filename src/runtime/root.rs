//! Root containers: the producer-facing end of a chain
//!
//! A root is created already `Settling`, since nothing upstream feeds it. Its
//! setup routine runs synchronously and receives the two settle callbacks,
//! which the producer calls whenever it likes, now or from a scheduled task.

use tracing::debug;

use crate::runtime::cell::reaction::isolate;
use crate::runtime::cell::{CellKind, CellState, Deferred, EffectOutput, Outcome};
use crate::runtime::scheduler;
use crate::runtime::value::Value;

/// Settle-with-value callback handed to a root's setup routine.
///
/// Only the first call on either this or the paired [`Rejecter`] counts;
/// later calls are no-ops reported through `tracing`.
#[derive(Debug, Clone)]
pub struct Resolver {
    cell: Deferred,
}

impl Resolver {
    /// Resolve the root with `value`.
    pub fn resolve(
        &self,
        value: impl Into<Value>,
    ) {
        let _ = self.cell.settle_value(value);
    }

    /// The root this callback settles.
    pub fn cell(&self) -> &Deferred {
        &self.cell
    }
}

/// Settle-with-error callback handed to a root's setup routine.
#[derive(Debug, Clone)]
pub struct Rejecter {
    cell: Deferred,
}

impl Rejecter {
    /// Reject the root with `error`.
    pub fn reject(
        &self,
        error: impl Into<Value>,
    ) {
        let _ = self.cell.settle_error(error);
    }

    /// The root this callback settles.
    pub fn cell(&self) -> &Deferred {
        &self.cell
    }
}

impl Deferred {
    /// Create a root container and run `setup` on it immediately.
    ///
    /// `setup` gets the [`Resolver`] and [`Rejecter`] for the new root. If it
    /// returns `Err` or panics before the root is settled, the root rejects
    /// with that fault.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use pledge::{scheduler, Deferred};
    ///
    /// let root = Deferred::new(|resolve, _reject| {
    ///     scheduler::schedule_after(Duration::from_millis(1000), move || resolve.resolve(1));
    /// });
    /// let doubled = root.then(|v| v.to_int().unwrap_or(0) * 2);
    ///
    /// scheduler::run();
    /// assert_eq!(doubled.value(), Some(2.into()));
    /// ```
    pub fn new<F, R>(setup: F) -> Deferred
    where
        F: FnOnce(Resolver, Rejecter) -> R,
        R: EffectOutput,
    {
        let root = Self::with_state(CellKind::Root, CellState::Settling, None);
        let resolver = Resolver { cell: root.clone() };
        let rejecter = Rejecter { cell: root.clone() };

        if let Err(fault) = isolate(move || setup(resolver, rejecter).into_effect_result()) {
            if root.state() == CellState::Settling {
                let _ = root.settle(Outcome::Error(fault));
            } else {
                debug!("{} setup faulted after settling: {}", root.id(), fault);
            }
        }
        root
    }

    /// A root plus its settle callbacks, for producers that settle from
    /// outside a setup closure.
    pub fn pending() -> (Deferred, Resolver, Rejecter) {
        let root = Self::with_state(CellKind::Root, CellState::Settling, None);
        let resolver = Resolver { cell: root.clone() };
        let rejecter = Rejecter { cell: root.clone() };
        (root, resolver, rejecter)
    }

    /// A root that resolves with `value` on the next scheduler turn.
    ///
    /// Settlement is queued rather than done inline, so continuations attached
    /// right after this call see the usual feed-then-settle sequence.
    pub fn resolve(value: impl Into<Value>) -> Deferred {
        let value = value.into();
        Deferred::new(move |resolve, _| {
            scheduler::schedule(move || resolve.resolve(value));
        })
    }

    /// A root that rejects with `error` on the next scheduler turn.
    pub fn reject(error: impl Into<Value>) -> Deferred {
        let error = error.into();
        Deferred::new(move |_, reject| {
            scheduler::schedule(move || reject.reject(error));
        })
    }

    /// A root that is already settled with `outcome`.
    pub(crate) fn settled(outcome: Outcome) -> Deferred {
        let root = Self::with_state(CellKind::Root, CellState::Settling, None);
        let _ = root.settle(outcome);
        root
    }
}
