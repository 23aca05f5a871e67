//! Common types and utilities shared across memtree.
//!
//! This module contains the primitives every other module leans on:
//! - Configuration constants and [`TreeConfig`]
//! - Error types

pub mod config;
pub mod error;

pub use config::TreeConfig;
pub use error::{Error, Result};
