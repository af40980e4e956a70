//! Continuation and finalizer reactions
//!
//! A reaction is what a cell does when it is fed. Continuation nodes run the
//! value or error handler and settle from its result; finalizer nodes run a
//! cleanup handler and settle with whatever they were fed.
//!
//! Every handler call goes through [`isolate`]: a returned `Err` and a panic are
//! both turned into a fault that rejects the node instead of unwinding through
//! the cell that is notifying it.

use std::panic::{self, AssertUnwindSafe};

use super::state::Outcome;
use super::Deferred;
use crate::runtime::value::Value;

/// What a value or error handler produced.
///
/// A `Chainable` result is flattened: the node settles only once the returned
/// computation settles, and with the same outcome.
#[derive(Debug, Clone)]
pub enum HandlerResult {
    /// An ordinary value.
    Plain(Value),
    /// Another deferred computation.
    Chainable(Deferred),
}

impl HandlerResult {
    /// The computation the node should mirror.
    ///
    /// Plain values are wrapped in an already-settled root so both variants
    /// take the same settle-waiter path.
    pub(crate) fn into_source(self) -> Deferred {
        match self {
            HandlerResult::Plain(value) => Deferred::settled(Outcome::Value(value)),
            HandlerResult::Chainable(cell) => cell,
        }
    }
}

impl From<Deferred> for HandlerResult {
    fn from(cell: Deferred) -> Self {
        HandlerResult::Chainable(cell)
    }
}

impl From<&Deferred> for HandlerResult {
    fn from(cell: &Deferred) -> Self {
        HandlerResult::Chainable(cell.clone())
    }
}

impl From<Value> for HandlerResult {
    fn from(value: Value) -> Self {
        HandlerResult::Plain(value)
    }
}

/// Conversion from a handler's return type.
///
/// Implemented for plain values, [`Deferred`], [`HandlerResult`] and
/// `Result<T, E>` where `Err(e)` raises `e` as the node's fault.
pub trait HandlerOutput {
    /// Split into the handler's result or its fault.
    fn into_handler_result(self) -> Result<HandlerResult, Value>;
}

impl HandlerOutput for HandlerResult {
    fn into_handler_result(self) -> Result<HandlerResult, Value> {
        Ok(self)
    }
}

impl HandlerOutput for Deferred {
    fn into_handler_result(self) -> Result<HandlerResult, Value> {
        Ok(HandlerResult::Chainable(self))
    }
}

impl HandlerOutput for Value {
    fn into_handler_result(self) -> Result<HandlerResult, Value> {
        Ok(HandlerResult::Plain(self))
    }
}

impl<T: HandlerOutput, E: Into<Value>> HandlerOutput for Result<T, E> {
    fn into_handler_result(self) -> Result<HandlerResult, Value> {
        match self {
            Ok(output) => output.into_handler_result(),
            Err(fault) => Err(fault.into()),
        }
    }
}

macro_rules! plain_output {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for HandlerResult {
                fn from(value: $ty) -> Self {
                    HandlerResult::Plain(Value::from(value))
                }
            }

            impl HandlerOutput for $ty {
                fn into_handler_result(self) -> Result<HandlerResult, Value> {
                    Ok(HandlerResult::Plain(Value::from(self)))
                }
            }
        )*
    };
}

plain_output!((), bool, i32, i64, u32, f64, char, String, Vec<Value>);

impl From<&str> for HandlerResult {
    fn from(value: &str) -> Self {
        HandlerResult::Plain(Value::from(value))
    }
}

impl HandlerOutput for &str {
    fn into_handler_result(self) -> Result<HandlerResult, Value> {
        Ok(HandlerResult::Plain(Value::from(self)))
    }
}

/// Conversion from a setup or cleanup routine's return type.
///
/// Only faults matter: `()` and `Ok(_)` are success, `Err(e)` raises `e`.
pub trait EffectOutput {
    /// Success, or the raised fault.
    fn into_effect_result(self) -> Result<(), Value>;
}

impl EffectOutput for () {
    fn into_effect_result(self) -> Result<(), Value> {
        Ok(())
    }
}

impl<T, E: Into<Value>> EffectOutput for Result<T, E> {
    fn into_effect_result(self) -> Result<(), Value> {
        self.map(|_| ()).map_err(Into::into)
    }
}

/// Run `f`, converting a panic into a fault.
pub(crate) fn isolate<T>(f: impl FnOnce() -> Result<T, Value>) -> Result<T, Value> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Value::from_panic(payload)),
    }
}

pub(crate) type ValueHandler = Box<dyn FnOnce(Value) -> Result<HandlerResult, Value>>;
pub(crate) type CleanupHandler = Box<dyn FnOnce() -> Result<(), Value>>;

/// Single-shot behavior run when a cell is fed.
pub(crate) enum Reaction {
    /// `then` / `catch`: an absent handler forwards the outcome unchanged.
    Continuation {
        on_value: Option<ValueHandler>,
        on_error: Option<ValueHandler>,
    },
    /// `finally`: observe, then pass the fed outcome through.
    Finalizer { on_done: Option<CleanupHandler> },
}

impl Reaction {
    /// React to `input` on behalf of `node`, which has just moved to `Settling`.
    pub(crate) fn react(
        self,
        node: &Deferred,
        input: Outcome,
    ) {
        match self {
            Reaction::Continuation { on_value, on_error } => {
                let handler = if input.is_value() { on_value } else { on_error };
                let Some(handler) = handler else {
                    // No handler for this path: forward transparently
                    let _ = node.settle(input);
                    return;
                };
                match isolate(move || handler(input.into_inner())) {
                    Ok(result) => node.follow(result.into_source()),
                    Err(fault) => {
                        let _ = node.settle(Outcome::Error(fault));
                    }
                }
            }
            Reaction::Finalizer { on_done } => {
                let cleanup = match on_done {
                    Some(on_done) => isolate(on_done),
                    None => Ok(()),
                };
                // A cleanup fault replaces the fed outcome
                let outcome = match cleanup {
                    Ok(()) => input,
                    Err(fault) => Outcome::Error(fault),
                };
                let _ = node.settle(outcome);
            }
        }
    }
}
