//! Cell identifiers
//!
//! Every cell carries a process-unique id. Ids are for diagnostics only: no
//! part of the feed/settle protocol depends on them.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A unique identifier for a deferred cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub usize);

impl CellId {
    /// Returns the inner value of the cell ID.
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Cell({})", self.0)
    }
}

/// Generator for creating unique cell IDs.
///
/// # Examples
///
/// ```
/// use pledge::runtime::cell::CellIdGenerator;
///
/// let generator = CellIdGenerator::new();
/// let id1 = generator.generate();
/// let id2 = generator.generate();
/// assert_ne!(id1, id2);
/// ```
#[derive(Debug)]
pub struct CellIdGenerator {
    next_id: AtomicUsize,
}

impl CellIdGenerator {
    /// Create a new cell ID generator.
    #[inline]
    pub const fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(0),
        }
    }

    /// Generate a new unique cell ID.
    #[inline]
    pub fn generate(&self) -> CellId {
        CellId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CellIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide generator used by every cell constructor.
pub(crate) static CELL_IDS: CellIdGenerator = CellIdGenerator::new();
