//! Deferred cell unit tests
//!
//! Feed/settle guards, waiter registration, chaining and root containers


use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::value::Value;

/// Shared log that handlers push into.
fn recorder() -> Rc<RefCell<Vec<Value>>> {
    Rc::new(RefCell::new(Vec::new()))
}
