//! # Clustree
//!
//! A persistent, disk-backed cluster tree for approximate nearest-neighbor
//! search over a growing point set.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Incremental insertion with bounded fan-out
//! - Centroid-maintained cluster hierarchy
//! - Lazy, backtracking nearest-neighbor enumeration
//! - Pluggable storage backends

pub mod cli;
pub mod error;
pub mod storage;
pub mod tree;

pub use crate::error::{ClustreeError, Result};
pub use crate::tree::{ClusterTree, Neighbor, NodeId, Point, TreeConfig};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
