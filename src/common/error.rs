//! Error types for memtree.
//!
//! Missing keys are not errors: `fetch` and `delete` report absence with
//! `None`. The variants here cover rejected configuration and the
//! structural problems `BTree::check` can find.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in memtree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested order is below the supported minimum.
    #[error("invalid order {order}: must be at least {min}")]
    InvalidOrder { order: usize, min: usize },

    /// Two entries in the same node are not strictly ascending.
    #[error("key {key} at depth {depth} does not follow {previous}")]
    KeyOutOfOrder { depth: usize, previous: u64, key: u64 },

    /// A key sits outside the range its parent separators allow.
    #[error("key {key} at depth {depth} outside separator range [{low:?}, {high:?})")]
    KeyOutOfRange {
        depth: usize,
        key: u64,
        low: Option<u64>,
        high: Option<u64>,
    },

    /// A node holds more than `order` entries.
    #[error("node at depth {depth} holds {len} entries, max is {max}")]
    Overflow { depth: usize, len: usize, max: usize },

    /// A non-root node holds fewer than `order / 2` entries.
    #[error("node at depth {depth} holds {len} entries, min is {min}")]
    Underflow { depth: usize, len: usize, min: usize },

    /// An internal node does not have exactly one more child than entries.
    #[error("internal node at depth {depth} has {entries} entries but {children} children")]
    ChildCountMismatch {
        depth: usize,
        entries: usize,
        children: usize,
    },

    /// Leaves are not all at the same depth.
    #[error("leaf found at depth {found}, expected {expected}")]
    UnevenLeafDepth { expected: usize, found: usize },

    /// Incrementally maintained statistics disagree with a full recount.
    #[error("stats field `{field}` is {tracked}, recount gives {actual}")]
    StatsMismatch {
        field: &'static str,
        tracked: usize,
        actual: usize,
    },
}
