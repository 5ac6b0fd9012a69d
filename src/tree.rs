//! Disk-backed cluster tree for approximate nearest-neighbor search.
//!
//! Points are organized into a hierarchy of clusters. Every interior node sits
//! at the centroid of its immediate children, and each sibling layer holds at
//! most `max_leafs` nodes.
//!
//! # Module Structure
//!
//! - `node`: node model and identifiers
//! - `codec` / `store`: record encoding and the persistent node store
//! - `path`: greedy nearest-child descent
//! - `insert` / `propagate`: insertion, depth extension and centroid updates
//! - `nearest`: lazy backtracking neighbor enumeration
//! - `index`: the [`ClusterTree`] handle tying it together

pub mod codec;
pub mod config;
pub mod distance;
pub mod index;
pub mod insert;
pub mod nearest;
pub mod node;
pub mod path;
pub mod propagate;
pub mod stats;
pub mod store;

pub use self::config::TreeConfig;
pub use self::index::ClusterTree;
pub use self::nearest::{Nearest, Neighbor};
pub use self::node::{Node, NodeId, Point};
pub use self::path::{Layer, Path};
pub use self::stats::{TreeStats, ValidationReport, Violation};
