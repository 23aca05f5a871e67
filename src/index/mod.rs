//! Index structures.
//!
//! Currently implements:
//! - [`btree`] - In-memory B-tree keyed by `u64`

pub mod btree;
