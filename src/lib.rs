//! memtree - an in-memory ordered key-value store backed by a B-tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          memtree                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │              Tree Engine (index/btree)                │  │
//! │  │   insert / fetch / delete / iterate / stats / check   │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │          ↓ owns                          ↑ borrows          │
//! │  ┌──────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          Node            │  │     Iter (cursor)       │  │
//! │  │ entries + owned children │  │ stack of (node, pos)    │  │
//! │  │ split / join / borrow    │  │                         │  │
//! │  └──────────────────────────┘  └─────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │      Common (common/): TreeConfig, Error, Result      │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (config, error)
//! - [`index`] - Index structures (B-tree)
//!
//! # Quick Start
//! ```
//! use memtree::BTree;
//!
//! let mut tree = BTree::new(4);
//! for (key, value) in [(10, "a"), (20, "b"), (5, "c"), (15, "d"), (25, "e")] {
//!     tree.insert(key, value);
//! }
//!
//! assert_eq!(tree.fetch(15), Some(&"d"));
//! assert_eq!(tree.keys().collect::<Vec<_>>(), vec![5, 10, 15, 20, 25]);
//!
//! tree.delete(10);
//! assert_eq!(tree.fetch(10), None);
//! assert!(tree.check().is_ok());
//! ```

pub mod common;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_ORDER, MIN_ORDER};
pub use common::{Error, Result, TreeConfig};

pub use index::btree::{BTree, Iter, Keys, TreeStats, Values};
