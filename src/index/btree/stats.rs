//! B-tree statistics tracking.

use std::fmt;

/// Shape counters maintained by the tree as it changes.
///
/// The engine updates these on every split, merge, root growth and root
/// shrink, so reading them is O(1). They are an observability aid only;
/// no algorithm consults them. `BTree::check` recounts and compares.
///
/// # Example
/// ```
/// use memtree::BTree;
///
/// let mut tree = BTree::new(4);
/// for key in 0..5 {
///     tree.insert(key, ());
/// }
/// let stats = tree.stats();
/// assert_eq!(stats.size, 5);
/// assert_eq!(stats.depth, 2);
/// assert_eq!(stats.leaves, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of distinct keys stored.
    pub size: usize,

    /// Number of levels. A tree whose root is a leaf has depth 1.
    pub depth: usize,

    /// Number of internal (non-leaf) nodes, root included.
    pub internal_nodes: usize,

    /// Number of leaf nodes.
    pub leaves: usize,
}

impl TreeStats {
    /// Stats for a tree consisting of one empty leaf.
    pub const fn new() -> Self {
        Self {
            size: 0,
            depth: 1,
            internal_nodes: 0,
            leaves: 1,
        }
    }

    /// Total number of nodes.
    pub fn nodes(&self) -> usize {
        self.internal_nodes + self.leaves
    }

    /// Average node fill relative to `order` (0.0 to 1.0).
    pub fn average_fill(&self, order: usize) -> f64 {
        let capacity = self.nodes() * order;
        if capacity == 0 {
            0.0
        } else {
            self.size as f64 / capacity as f64
        }
    }
}

impl Default for TreeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ size: {}, depth: {}, internal: {}, leaves: {} }}",
            self.size, self.depth, self.internal_nodes, self.leaves
        )
    }
}
