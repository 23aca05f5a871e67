//! Node - one level of the B-tree.
//!
//! A [`Node`] holds a sorted run of [`Entry`] values and, when internal,
//! one more child than it has entries. The recursive insert/delete
//! primitives live here; they report structural changes to the caller
//! through [`Insertion`] and [`Removal`] instead of touching the parent.

use std::mem;

use tracing::trace;

use crate::common::config::min_occupancy;
use crate::index::btree::TreeStats;

/// A key with its value.
///
/// Internal nodes store live entries too, not just separator keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry<V> {
    pub(crate) key: u64,
    pub(crate) value: V,
}

impl<V> Entry<V> {
    #[inline]
    pub(crate) fn new(key: u64, value: V) -> Self {
        Self { key, value }
    }
}

/// What an insert did to the subtree it was applied to.
#[derive(Debug)]
pub(crate) enum Insertion<V> {
    /// A new entry was added and the node still fits.
    Inserted,
    /// The key already existed; its old value is returned.
    Replaced(V),
    /// The node overflowed. `right` is the new right sibling and `median`
    /// must be placed in the parent between the two.
    Split { median: Entry<V>, right: Node<V> },
}

/// What a delete did to the subtree it was applied to.
#[derive(Debug)]
pub(crate) struct Removal<V> {
    /// The removed value, or `None` if the key was absent.
    pub(crate) removed: Option<V>,
    /// Entries left in the node the call was made on. The caller compares
    /// this against the minimum occupancy to decide whether to rebalance.
    pub(crate) remaining: usize,
}

/// A B-tree node. Leaf iff `children` is empty.
#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    pub(crate) entries: Vec<Entry<V>>,
    pub(crate) children: Vec<Node<V>>,
}

impl<V> Node<V> {
    /// Create an empty leaf sized for `order`.
    pub(crate) fn leaf(order: usize) -> Self {
        Self {
            entries: Vec::with_capacity(order + 1),
            children: Vec::new(),
        }
    }

    /// Create a root with a single entry and two children.
    pub(crate) fn branch(order: usize, median: Entry<V>, left: Node<V>, right: Node<V>) -> Self {
        let mut entries = Vec::with_capacity(order + 1);
        entries.push(median);
        let mut children = Vec::with_capacity(order + 2);
        children.push(left);
        children.push(right);
        Self { entries, children }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Upper-bound search: first position whose key is greater than `key`.
    ///
    /// `entries[..pos]` are all `<= key`, so a match exists iff
    /// `pos > 0 && entries[pos - 1].key == key`. For internal nodes,
    /// `children[pos]` is the subtree that may contain `key`.
    #[inline]
    pub(crate) fn locate(&self, key: u64) -> usize {
        self.entries.partition_point(|entry| entry.key <= key)
    }

    #[inline]
    pub(crate) fn matches(&self, pos: usize, key: u64) -> bool {
        pos > 0 && self.entries[pos - 1].key == key
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert `entry` into this subtree.
    pub(crate) fn insert(
        &mut self,
        order: usize,
        entry: Entry<V>,
        stats: &mut TreeStats,
    ) -> Insertion<V> {
        let pos = self.locate(entry.key);

        if self.matches(pos, entry.key) {
            let old = mem::replace(&mut self.entries[pos - 1].value, entry.value);
            return Insertion::Replaced(old);
        }

        if self.is_leaf() {
            self.entries.insert(pos, entry);
            stats.size += 1;
            return self.split_if_overflowing(order, stats);
        }

        match self.children[pos].insert(order, entry, stats) {
            Insertion::Split { median, right } => {
                self.entries.insert(pos, median);
                self.children.insert(pos + 1, right);
                self.split_if_overflowing(order, stats)
            }
            other => other,
        }
    }

    fn split_if_overflowing(&mut self, order: usize, stats: &mut TreeStats) -> Insertion<V> {
        if self.len() > order {
            let (right, median) = self.split(order, stats);
            Insertion::Split { median, right }
        } else {
            Insertion::Inserted
        }
    }

    /// Split around `entries[order / 2]`.
    ///
    /// Left keeps `[0, m)`, the median is returned, right takes `[m + 1, len)`.
    /// Internal nodes keep children `[0, m + 1)` and hand the rest to the
    /// right node. Works for any length above `order`, which the re-split
    /// after a join relies on.
    pub(crate) fn split(&mut self, order: usize, stats: &mut TreeStats) -> (Node<V>, Entry<V>) {
        let m = order / 2;
        debug_assert!(self.len() > m, "split of a node with {} entries", self.len());

        let mut right_entries = Vec::with_capacity(order + 1);
        right_entries.extend(self.entries.drain(m + 1..));
        let median = self.entries.remove(m);

        let mut right_children = Vec::new();
        if self.is_leaf() {
            stats.leaves += 1;
        } else {
            right_children.reserve(order + 2);
            right_children.extend(self.children.drain(m + 1..));
            stats.internal_nodes += 1;
        }

        trace!(
            median = median.key,
            left = self.len(),
            right = right_entries.len(),
            leaf = right_children.is_empty(),
            "btree.split"
        );

        let right = Node {
            entries: right_entries,
            children: right_children,
        };
        (right, median)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove `key` from this subtree.
    pub(crate) fn delete(&mut self, order: usize, key: u64, stats: &mut TreeStats) -> Removal<V> {
        let pos = self.locate(key);
        let min = min_occupancy(order);

        let removed = if self.matches(pos, key) {
            stats.size -= 1;
            if self.is_leaf() {
                Some(self.entries.remove(pos - 1).value)
            } else {
                // The separator goes away; its predecessor takes its place.
                let (predecessor, remaining) = self.children[pos - 1].take_last(order, stats);
                let old = mem::replace(&mut self.entries[pos - 1], predecessor);
                if remaining < min {
                    self.balance(order, pos - 1, stats);
                }
                Some(old.value)
            }
        } else if self.is_leaf() {
            None
        } else {
            let child = self.children[pos].delete(order, key, stats);
            if child.remaining < min {
                self.balance(order, pos, stats);
            }
            child.removed
        };

        Removal {
            removed,
            remaining: self.len(),
        }
    }

    /// Detach the greatest entry of this subtree.
    ///
    /// Follows the rightmost child chain down to a leaf. Returns the entry
    /// and the number of entries left in this node.
    pub(crate) fn take_last(&mut self, order: usize, stats: &mut TreeStats) -> (Entry<V>, usize) {
        if self.is_leaf() {
            let last = self.len() - 1;
            let entry = self.entries.remove(last);
            return (entry, self.len());
        }

        let last = self.children.len() - 1;
        let (entry, remaining) = self.children[last].take_last(order, stats);
        if remaining < min_occupancy(order) {
            self.balance(order, last, stats);
        }
        (entry, self.len())
    }

    /// Repair the underflowed child at `pos` by joining it with a sibling.
    ///
    /// The pair is `(pos, pos + 1)` when `pos == 0`, otherwise
    /// `(pos - 1, pos)`. The two nodes and their separator are concatenated;
    /// if the result overflows it is split again and the new median replaces
    /// the separator, otherwise the parent loses one entry and one child.
    pub(crate) fn balance(&mut self, order: usize, pos: usize, stats: &mut TreeStats) {
        let left = if pos == 0 { 0 } else { pos - 1 };

        let right_node = self.children.remove(left + 1);
        let separator = self.entries.remove(left);
        if right_node.is_leaf() {
            stats.leaves -= 1;
        } else {
            stats.internal_nodes -= 1;
        }

        let joined = &mut self.children[left];
        joined.entries.push(separator);
        joined.entries.extend(right_node.entries);
        joined.children.extend(right_node.children);

        if joined.len() > order {
            let (right, median) = joined.split(order, stats);
            trace!(pos = left, separator = median.key, "btree.rebalance");
            self.entries.insert(left, median);
            self.children.insert(left + 1, right);
        } else {
            trace!(pos = left, joined = joined.len(), "btree.merge");
        }
    }
}
