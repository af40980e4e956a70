//! Runtime system
//!
//! This module contains the deferred cell protocol, its producer and consumer
//! surfaces, and the cooperative scheduler that drives deferred settlement.

pub mod cell;
pub mod combinator;
pub mod root;
pub mod scheduler;
pub mod value;
