//! In-memory B-tree index.
//!
//! [`BTree`] maps `u64` keys to values of any type. Every node holds at
//! most `order` entries and, apart from the root, at least `order / 2`.
//! Entries live in internal nodes as well as leaves, so a lookup can stop
//! as soon as it meets its key.
//!
//! # Components
//! - [`BTree`] - The tree engine: insert, fetch, delete, iterate
//! - [`Iter`] / [`Keys`] / [`Values`] - Pull-based in-order cursors
//! - [`TreeStats`] - Incrementally maintained shape counters
//!
//! # Structural changes
//! ```text
//!  insert overflow (order 4)           delete underflow (order 4)
//!
//!  [10 20 25 30 40]                     [ 20 ]
//!        │ split at m = 2                /    \
//!        ▼                          [10]      [30 40]
//!      [ 25 ]                          │ join with separator
//!     /      \                         ▼
//!  [10 20]  [30 40]                 [10 20 30 40]  (root shrinks)
//! ```
//!
//! Splits and underflows travel up the call stack as return values; no
//! node holds a reference to its parent.

mod iter;
mod node;
mod stats;

use std::fmt;
use std::mem;

use tracing::{debug, trace};

use crate::common::config::{min_occupancy, TreeConfig, DEFAULT_ORDER, MIN_ORDER};
use crate::common::{Error, Result};

pub use iter::{Iter, Keys, Values};
pub use stats::TreeStats;

use node::{Entry, Insertion, Node, Removal};

/// An ordered map from `u64` keys to `V`, backed by a B-tree of fixed order.
///
/// # Example
/// ```
/// use memtree::BTree;
///
/// let mut tree = BTree::new(4);
/// tree.insert(10, "a");
/// tree.insert(20, "b");
/// tree.insert(5, "c");
///
/// assert_eq!(tree.fetch(20), Some(&"b"));
/// assert_eq!(tree.delete(10), Some("a"));
/// assert_eq!(tree.keys().collect::<Vec<_>>(), vec![5, 20]);
/// ```
///
/// # Concurrency
/// The tree has no internal locking. Shared borrows (`fetch`, `iter`) may
/// overlap each other; mutation needs `&mut self`, so the borrow checker
/// keeps a mutation from running under an in-flight iteration.
#[derive(Clone)]
pub struct BTree<V> {
    /// Maximum entries per node (`N`), fixed at construction.
    order: usize,

    /// The root is exempt from the minimum-occupancy rule.
    root: Node<V>,

    /// Shape counters, updated alongside every structural change.
    stats: TreeStats,
}

impl<V> BTree<V> {
    /// Create an empty tree of the given order.
    ///
    /// # Panics
    /// Panics if `order < 2`. Use [`BTree::try_new`] to get an error instead.
    pub fn new(order: usize) -> Self {
        assert!(order >= MIN_ORDER, "order must be >= {}", MIN_ORDER);
        Self::build(order)
    }

    /// Create an empty tree, rejecting unusable orders.
    ///
    /// # Errors
    /// `Error::InvalidOrder` if `order < 2`.
    pub fn try_new(order: usize) -> Result<Self> {
        Self::with_config(TreeConfig::new(order))
    }

    /// Create an empty tree from a [`TreeConfig`].
    ///
    /// # Errors
    /// `Error::InvalidOrder` if the config does not validate.
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.order))
    }

    fn build(order: usize) -> Self {
        debug!(order, "btree.create");
        Self {
            order,
            root: Node::leaf(order),
            stats: TreeStats::new(),
        }
    }

    // ========================================================================
    // Public API: Accessors
    // ========================================================================

    /// Maximum entries per node.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of keys stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.stats.size
    }

    /// Whether the tree holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stats.size == 0
    }

    /// Number of levels; 1 while the root is a leaf.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stats.depth
    }

    /// Snapshot of the shape counters.
    #[inline]
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    // ========================================================================
    // Public API: Lookups
    // ========================================================================

    /// Look up the value stored under `key`.
    pub fn fetch(&self, key: u64) -> Option<&V> {
        let mut node = &self.root;
        loop {
            let pos = node.locate(key);
            if node.matches(pos, key) {
                return Some(&node.entries[pos - 1].value);
            }
            if node.is_leaf() {
                return None;
            }
            node = &node.children[pos];
        }
    }

    /// Mutable access to the value stored under `key`.
    pub fn fetch_mut(&mut self, key: u64) -> Option<&mut V> {
        let mut node = &mut self.root;
        loop {
            let pos = node.locate(key);
            if node.matches(pos, key) {
                return Some(&mut node.entries[pos - 1].value);
            }
            if node.is_leaf() {
                return None;
            }
            node = &mut node.children[pos];
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: u64) -> bool {
        self.fetch(key).is_some()
    }

    // ========================================================================
    // Public API: Mutation
    // ========================================================================

    /// Insert or overwrite the value for `key`.
    ///
    /// Returns the previous value if the key was already present, in which
    /// case the entry is updated in place and the tree keeps its shape.
    /// Otherwise the entry is added, possibly growing the tree by a level.
    pub fn insert(&mut self, key: u64, value: V) -> Option<V> {
        match self
            .root
            .insert(self.order, Entry::new(key, value), &mut self.stats)
        {
            Insertion::Inserted => None,
            Insertion::Replaced(old) => Some(old),
            Insertion::Split { median, right } => {
                let left = mem::replace(&mut self.root, Node::leaf(0));
                self.root = Node::branch(self.order, median, left, right);
                self.stats.internal_nodes += 1;
                self.stats.depth += 1;
                trace!(depth = self.stats.depth, "btree.root_grow");
                None
            }
        }
    }

    /// Remove `key`, returning its value.
    ///
    /// Absent keys return `None` and leave the tree untouched.
    pub fn delete(&mut self, key: u64) -> Option<V> {
        let Removal { removed, remaining } = self.root.delete(self.order, key, &mut self.stats);

        if remaining == 0 && !self.root.is_leaf() {
            // An empty internal root has exactly one child left.
            let child = self.root.children.remove(0);
            self.root = child;
            self.stats.internal_nodes -= 1;
            self.stats.depth -= 1;
            trace!(depth = self.stats.depth, "btree.root_shrink");
        }

        removed
    }

    /// Remove every entry, keeping the order.
    pub fn clear(&mut self) {
        self.root = Node::leaf(self.order);
        self.stats = TreeStats::new();
    }

    // ========================================================================
    // Public API: Iteration
    // ========================================================================

    /// Iterate over `(key, &value)` in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(&self.root, self.stats.size)
    }

    /// Iterate over keys in ascending order.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys { inner: self.iter() }
    }

    /// Iterate over values in ascending key order.
    pub fn values(&self) -> Values<'_, V> {
        Values { inner: self.iter() }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Walk the whole tree and verify its invariants.
    ///
    /// Checks key ordering against every separator, node occupancy, child
    /// counts, that all leaves share one depth, and that the incremental
    /// [`TreeStats`] match a recount.
    ///
    /// # Errors
    /// The first violation found, as one of the structural [`Error`] variants.
    pub fn check(&self) -> Result<()> {
        let mut census = Census::default();
        self.check_node(&self.root, 1, None, None, &mut census)?;

        let recount = [
            ("size", self.stats.size, census.size),
            ("depth", self.stats.depth, census.leaf_depth.unwrap_or(1)),
            ("internal_nodes", self.stats.internal_nodes, census.internal_nodes),
            ("leaves", self.stats.leaves, census.leaves),
        ];
        for (field, tracked, actual) in recount {
            if tracked != actual {
                return Err(Error::StatsMismatch {
                    field,
                    tracked,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn check_node(
        &self,
        node: &Node<V>,
        depth: usize,
        low: Option<u64>,
        high: Option<u64>,
        census: &mut Census,
    ) -> Result<()> {
        let len = node.len();
        if len > self.order {
            return Err(Error::Overflow {
                depth,
                len,
                max: self.order,
            });
        }
        let min = min_occupancy(self.order);
        if depth > 1 && len < min {
            return Err(Error::Underflow { depth, len, min });
        }

        let mut previous: Option<u64> = None;
        for entry in &node.entries {
            if let Some(prev) = previous {
                if entry.key <= prev {
                    return Err(Error::KeyOutOfOrder {
                        depth,
                        previous: prev,
                        key: entry.key,
                    });
                }
            }
            let below_low = low.is_some_and(|l| entry.key < l);
            let above_high = high.is_some_and(|h| entry.key >= h);
            if below_low || above_high {
                return Err(Error::KeyOutOfRange {
                    depth,
                    key: entry.key,
                    low,
                    high,
                });
            }
            previous = Some(entry.key);
        }
        census.size += len;

        if node.is_leaf() {
            census.leaves += 1;
            match census.leaf_depth {
                None => census.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(Error::UnevenLeafDepth {
                        expected,
                        found: depth,
                    });
                }
                Some(_) => {}
            }
            return Ok(());
        }

        if node.children.len() != len + 1 {
            return Err(Error::ChildCountMismatch {
                depth,
                entries: len,
                children: node.children.len(),
            });
        }
        census.internal_nodes += 1;

        for (i, child) in node.children.iter().enumerate() {
            let child_low = if i == 0 { low } else { Some(node.entries[i - 1].key) };
            let child_high = node.entries.get(i).map(|e| e.key).or(high);
            self.check_node(child, depth + 1, child_low, child_high, census)?;
        }
        Ok(())
    }
}

/// Totals gathered by `check`.
#[derive(Default)]
struct Census {
    size: usize,
    internal_nodes: usize,
    leaves: usize,
    leaf_depth: Option<usize>,
}

impl<V> Default for BTree<V> {
    fn default() -> Self {
        Self::build(DEFAULT_ORDER)
    }
}

impl<V: fmt::Debug> fmt::Debug for BTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a BTree<V> {
    type Item = (u64, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<V> Extend<(u64, V)> for BTree<V> {
    fn extend<I: IntoIterator<Item = (u64, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<V> FromIterator<(u64, V)> for BTree<V> {
    fn from_iter<I: IntoIterator<Item = (u64, V)>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(tree: &BTree<V>) -> Vec<u64> {
        tree.keys().collect()
    }

    #[test]
    fn test_new_tree_is_empty() {
        let tree: BTree<u32> = BTree::new(4);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.fetch(1), None);
        assert_eq!(tree.iter().next(), None);
        assert!(tree.check().is_ok());
    }

    #[test]
    #[should_panic(expected = "order must be >= 2")]
    fn test_new_rejects_order_one() {
        let _tree: BTree<u32> = BTree::new(1);
    }

    #[test]
    fn test_try_new_reports_invalid_order() {
        let err = BTree::<u32>::try_new(0).unwrap_err();
        assert_eq!(err, Error::InvalidOrder { order: 0, min: 2 });
        assert!(BTree::<u32>::try_new(2).is_ok());
    }

    #[test]
    fn test_fifth_insert_splits_order_four() {
        let mut tree = BTree::new(4);
        for (key, value) in [(10, "a"), (20, "b"), (5, "c"), (15, "d")] {
            tree.insert(key, value);
        }
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.stats().leaves, 1);

        tree.insert(25, "e");

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.stats().leaves, 2);
        assert_eq!(tree.stats().internal_nodes, 1);
        assert_eq!(tree.root.entries[0].key, 15);
        assert_eq!(keys(&tree), vec![5, 10, 15, 20, 25]);
        assert_eq!(tree.fetch(15), Some(&"d"));
        tree.check().unwrap();
    }

    #[test]
    fn test_upsert_overwrites_internal_entry() {
        let mut tree = BTree::new(4);
        for key in 1..=5 {
            tree.insert(key, key * 10);
        }
        // Key 3 was promoted into the root by the split.
        assert_eq!(tree.root.entries[0].key, 3);

        assert_eq!(tree.insert(3, 333), Some(30));
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.fetch(3), Some(&333));
        tree.check().unwrap();
    }

    #[test]
    fn test_fetch_mut_updates_value() {
        let mut tree = BTree::new(3);
        for key in 0..20 {
            tree.insert(key, key);
        }
        if let Some(value) = tree.fetch_mut(7) {
            *value = 700;
        }
        assert_eq!(tree.fetch(7), Some(&700));
        assert_eq!(tree.fetch_mut(99), None);
    }

    #[test]
    fn test_delete_leaf_entry() {
        let mut tree = BTree::new(4);
        for key in [10, 20, 5, 15, 25] {
            tree.insert(key, key);
        }

        assert_eq!(tree.delete(10), Some(10));
        assert_eq!(tree.fetch(10), None);
        assert_eq!(keys(&tree), vec![5, 15, 20, 25]);
        tree.check().unwrap();
    }

    #[test]
    fn test_delete_internal_entry_borrows_predecessor() {
        let mut tree = BTree::new(4);
        for key in 1..=8 {
            tree.insert(key, key);
        }
        // Root separators: [3, 6], leaves [1 2] [4 5] [7 8].
        assert_eq!(tree.root.entries.iter().map(|e| e.key).collect::<Vec<_>>(), vec![3, 6]);

        assert_eq!(tree.delete(6), Some(6));

        assert_eq!(tree.fetch(6), None);
        assert_eq!(keys(&tree), vec![1, 2, 3, 4, 5, 7, 8]);
        tree.check().unwrap();
    }

    #[test]
    fn test_delete_missing_key_is_noop() {
        let mut tree = BTree::new(4);
        for key in 0..50 {
            tree.insert(key * 2, key);
        }
        let before: Vec<_> = tree.iter().map(|(k, v)| (k, *v)).collect();
        let stats = tree.stats();

        assert_eq!(tree.delete(7), None);
        assert_eq!(tree.delete(1000), None);

        let after: Vec<_> = tree.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(before, after);
        assert_eq!(stats, tree.stats());
    }

    #[test]
    fn test_root_shrinks_back_to_leaf() {
        let mut tree = BTree::new(4);
        for key in 1..=5 {
            tree.insert(key, ());
        }
        assert_eq!(tree.depth(), 2);

        tree.delete(1);
        tree.delete(2);

        assert_eq!(tree.depth(), 1);
        assert!(tree.root.is_leaf());
        assert_eq!(keys(&tree), vec![3, 4, 5]);
        tree.check().unwrap();
    }

    #[test]
    fn test_delete_everything_then_reuse() {
        for order in [2, 3, 4, 5, 8] {
            let mut tree = BTree::new(order);
            for key in 0..200u64 {
                tree.insert((key * 37) % 200, key);
            }
            tree.check().unwrap();

            for key in 0..200u64 {
                assert!(tree.delete(key).is_some(), "order {} key {}", order, key);
                tree.check().unwrap();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.depth(), 1);
            assert_eq!(tree.stats(), TreeStats::new());

            tree.insert(1, 1);
            assert_eq!(tree.fetch(1), Some(&1));
        }
    }

    #[test]
    fn test_odd_order_underflow_boundary() {
        // Order 5: min occupancy 2, a split leaves 2 on the left, 3 on the right.
        let mut tree = BTree::new(5);
        for key in 1..=6 {
            tree.insert(key, ());
        }
        assert_eq!(tree.root.entries[0].key, 3);
        assert_eq!(tree.root.children[0].len(), 2);
        assert_eq!(tree.root.children[1].len(), 3);
        tree.check().unwrap();

        // Left leaf drops to 1 < 2 and merges: 1 + 1 + 3 = 5 fits in one node.
        tree.delete(1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(keys(&tree), vec![2, 3, 4, 5, 6]);
        tree.check().unwrap();
    }

    #[test]
    fn test_even_order_rebalance_resplits() {
        // Order 4: leaves [1 2] 3 [4 5 6 7] after inserting 1..=7.
        let mut tree = BTree::new(4);
        for key in 1..=7 {
            tree.insert(key, ());
        }
        assert_eq!(tree.root.children[1].len(), 4);

        // Left drops to 1; joined = 1 + 1 + 4 = 6 > 4, so it splits again.
        tree.delete(1);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.root.entries[0].key, 4);
        assert_eq!(tree.root.children[0].len(), 2);
        assert_eq!(tree.root.children[1].len(), 3);
        tree.check().unwrap();
    }

    #[test]
    fn test_check_detects_corruption() {
        let mut tree = BTree::new(4);
        for key in 1..=5 {
            tree.insert(key, ());
        }
        let mut broken = tree.clone();
        broken.root.children[0].entries[0].key = 99;
        assert!(matches!(broken.check(), Err(Error::KeyOutOfRange { .. })));

        let mut broken = tree.clone();
        broken.stats.size += 1;
        assert!(matches!(
            broken.check(),
            Err(Error::StatsMismatch { field: "size", .. })
        ));

        let mut broken = tree.clone();
        broken.root.children[1].entries.pop();
        broken.root.children[1].entries.pop();
        broken.stats.size -= 2;
        assert!(matches!(broken.check(), Err(Error::Underflow { .. })));
    }

    #[test]
    fn test_clear_and_default() {
        let mut tree: BTree<u8> = BTree::default();
        assert_eq!(tree.order(), DEFAULT_ORDER);
        tree.extend((0..100).map(|k| (k, k as u8)));
        assert_eq!(tree.len(), 100);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.order(), DEFAULT_ORDER);
        tree.check().unwrap();
    }

    #[test]
    fn test_from_iterator_and_debug() {
        let tree: BTree<&str> = [(2, "b"), (1, "a"), (2, "B")].into_iter().collect();
        assert_eq!(tree.len(), 2);
        assert_eq!(format!("{:?}", tree), r#"{1: "a", 2: "B"}"#);

        let pairs: Vec<_> = (&tree).into_iter().collect();
        assert_eq!(pairs, vec![(1, &"a"), (2, &"B")]);
        assert_eq!(tree.values().collect::<Vec<_>>(), vec![&"a", &"B"]);
    }
}
