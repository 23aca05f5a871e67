//! Configuration for B-tree construction.

use crate::common::{Error, Result};

/// Smallest order a tree may be built with.
///
/// With `N = 2` a node holds one or two entries and the minimum occupancy
/// is one, which is the tightest shape the split/merge arithmetic supports.
pub const MIN_ORDER: usize = 2;

/// Order used by [`TreeConfig::default`] and by `BTree::default()`.
///
/// 32 entries of `u64` keys plus small values keep a node within a few
/// cache lines while still giving a shallow tree (depth 4 holds ~1M keys).
pub const DEFAULT_ORDER: usize = 32;

/// Minimum number of entries a non-root node must hold.
///
/// Integer floor of `order / 2`. For odd orders a node may sit exactly at
/// this value, which is also the size of the left half after a split.
#[inline]
pub const fn min_occupancy(order: usize) -> usize {
    order / 2
}

/// Construction parameters for a tree.
///
/// # Example
/// ```
/// use memtree::common::config::TreeConfig;
///
/// let config = TreeConfig::new(8);
/// assert!(config.validate().is_ok());
/// assert!(TreeConfig::new(1).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum number of entries per node (`N`).
    pub order: usize,
}

impl TreeConfig {
    /// Create a config with the given order.
    pub const fn new(order: usize) -> Self {
        Self { order }
    }

    /// Check that the order is usable.
    ///
    /// # Errors
    /// `Error::InvalidOrder` if `order < MIN_ORDER`.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(Error::InvalidOrder {
                order: self.order,
                min: MIN_ORDER,
            });
        }
        Ok(())
    }

    /// Underflow threshold for this order.
    pub const fn min_occupancy(&self) -> usize {
        min_occupancy(self.order)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}
