//! Combinators over collections of deferred cells
//!
//! Only `all` lives here; it is the template other aggregates would follow:
//! a fresh root container plus per-member continuations that write into state
//! shared by the whole call.

pub mod all;

pub use all::all;
