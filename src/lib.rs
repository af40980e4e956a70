//! Pledge - deferred cells with chainable continuations
//!
//! A [`Deferred`] starts empty, is eventually settled with exactly one value or
//! error, and lets consumers attach continuations before or after that
//! happens. Each continuation is itself a `Deferred`, so chains and trees
//! compose; errors travel down a chain untouched until something catches them.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use pledge::{scheduler, Deferred, Value};
//!
//! let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
//! let log = seen.clone();
//!
//! Deferred::new(|resolve, _| {
//!     scheduler::schedule_after(Duration::from_millis(1000), move || resolve.resolve(1));
//! })
//! .then(|v| {
//!     // Returning another deferred flattens the chain
//!     let doubled = v.to_int().unwrap_or(0) * 2;
//!     Deferred::new(move |resolve, _| {
//!         scheduler::schedule_after(Duration::from_millis(1000), move || resolve.resolve(doubled));
//!     })
//! })
//! .then(move |v| log.borrow_mut().push(v));
//!
//! scheduler::run();
//! assert_eq!(*seen.borrow(), vec![Value::Int(2)]);
//! ```

#![doc(html_root_url = "https://docs.rs/pledge")]
#![warn(rust_2018_idioms)]

pub mod demo;
pub mod runtime;
pub mod util;

// Re-exports
pub use runtime::cell::{
    CellId, CellKind, CellState, Deferred, EffectOutput, HandlerOutput, HandlerResult, Outcome,
    TransitionError,
};
pub use runtime::combinator::all;
pub use runtime::root::{Rejecter, Resolver};
pub use runtime::scheduler;
pub use runtime::value::{Value, ValueKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "Pledge";
