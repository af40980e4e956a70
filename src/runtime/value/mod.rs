//! Payload types for deferred cells
//!
//! This module provides the dynamic value carried by every cell, both on the
//! resolution path and on the rejection path.

pub mod runtime_value;
pub use runtime_value::*;

#[cfg(test)]
mod tests;
