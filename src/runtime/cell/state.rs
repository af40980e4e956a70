//! Cell state machine types

use std::fmt;

use thiserror::Error;

use super::id::CellId;
use crate::runtime::value::Value;

/// Lifecycle of a deferred cell.
///
/// ```text
/// AwaitingInput --feed--> Settling --settle--> Resolved | Rejected
/// ```
///
/// Root containers start in `Settling`: nothing feeds them, their producer
/// settles them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Waiting for the upstream cell to feed a value or error.
    AwaitingInput,
    /// Fed; waiting for the cell's own outcome.
    Settling,
    /// Settled with a value.
    Resolved,
    /// Settled with an error.
    Rejected,
}

impl CellState {
    /// Whether the cell has an outcome.
    #[inline]
    pub fn is_settled(&self) -> bool {
        matches!(self, CellState::Resolved | CellState::Rejected)
    }
}

impl fmt::Display for CellState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            CellState::AwaitingInput => "awaiting-input",
            CellState::Settling => "settling",
            CellState::Resolved => "resolved",
            CellState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Which role a cell plays in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Bare cell with no reaction; its owner settles it explicitly.
    Relay,
    /// Producer-facing container.
    Root,
    /// Value/error handler pair (`then`, `catch`).
    Continuation,
    /// Cleanup handler (`finally`).
    Finalizer,
}

impl fmt::Display for CellKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            CellKind::Relay => "relay",
            CellKind::Root => "root",
            CellKind::Continuation => "continuation",
            CellKind::Finalizer => "finalizer",
        };
        f.write_str(name)
    }
}

/// The value or error a cell was fed or settled with.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Resolution path.
    Value(Value),
    /// Rejection path.
    Error(Value),
}

impl Outcome {
    /// Whether this is the resolution path.
    #[inline]
    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    /// Whether this is the rejection path.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// The resolved value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    /// The rejection error, if any.
    pub fn error(&self) -> Option<&Value> {
        match self {
            Outcome::Value(_) => None,
            Outcome::Error(e) => Some(e),
        }
    }

    /// The payload, whichever path it travels.
    pub fn into_inner(self) -> Value {
        match self {
            Outcome::Value(v) | Outcome::Error(v) => v,
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            Outcome::Value(v) => Ok(v),
            Outcome::Error(e) => Err(e),
        }
    }

    /// State a cell settled with this outcome ends up in.
    #[inline]
    pub(crate) fn settled_state(&self) -> CellState {
        match self {
            Outcome::Value(_) => CellState::Resolved,
            Outcome::Error(_) => CellState::Rejected,
        }
    }
}

impl From<Result<Value, Value>> for Outcome {
    fn from(result: Result<Value, Value>) -> Self {
        match result {
            Ok(v) => Outcome::Value(v),
            Err(e) => Outcome::Error(e),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Outcome::Value(v) => write!(f, "value({})", v),
            Outcome::Error(e) => write!(f, "error({})", e),
        }
    }
}

/// Out-of-state feed or settle.
///
/// Never fatal: the offending call is a no-op. The error is returned to
/// callers of the low-level protocol and reported through `tracing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{id} must be awaiting input before feeding, found {state}")]
    NotAwaitingInput { id: CellId, state: CellState },
    #[error("{id} must be settling before resolve/reject, found {state}")]
    NotSettling { id: CellId, state: CellState },
}

impl TransitionError {
    /// Cell the rejected transition was aimed at.
    pub fn cell(&self) -> CellId {
        match self {
            TransitionError::NotAwaitingInput { id, .. } | TransitionError::NotSettling { id, .. } => *id,
        }
    }
}
