//! In-order cursors over a tree.
//!
//! [`Iter`] walks the tree with an explicit stack of `(node, position)`
//! frames. Each call to `next` does a bounded amount of work and nothing
//! runs in the background, so dropping a half-drained iterator is free.

use std::iter::FusedIterator;

use crate::index::btree::node::Node;

struct Frame<'a, V> {
    node: &'a Node<V>,
    /// Next entry of `node` to yield.
    index: usize,
}

/// Ascending iterator over `(key, &value)` pairs.
///
/// Created by [`BTree::iter`](crate::BTree::iter).
pub struct Iter<'a, V> {
    stack: Vec<Frame<'a, V>>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(root: &'a Node<V>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        if len > 0 {
            iter.descend(root);
        }
        iter
    }

    /// Push `node` and its leftmost path down to a leaf.
    fn descend(&mut self, mut node: &'a Node<V>) {
        loop {
            self.stack.push(Frame { node, index: 0 });
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            let node = frame.node;
            let index = frame.index;

            if index < node.entries.len() {
                frame.index += 1;
                // Everything under children[index + 1] sorts after this entry.
                if !node.is_leaf() {
                    self.descend(&node.children[index + 1]);
                }
                self.remaining -= 1;
                let entry = &node.entries[index];
                return Some((entry.key, &entry.value));
            }

            self.stack.pop();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self
                .stack
                .iter()
                .map(|frame| Frame {
                    node: frame.node,
                    index: frame.index,
                })
                .collect(),
            remaining: self.remaining,
        }
    }
}

/// Ascending iterator over keys.
#[derive(Clone)]
pub struct Keys<'a, V> {
    pub(crate) inner: Iter<'a, V>,
}

impl<V> Iterator for Keys<'_, V> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}

impl<V> FusedIterator for Keys<'_, V> {}

/// Values in ascending key order.
#[derive(Clone)]
pub struct Values<'a, V> {
    pub(crate) inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}

impl<V> FusedIterator for Values<'_, V> {}
