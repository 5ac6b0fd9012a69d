//! Node model for the cluster tree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClustreeError, Result};

/// Suffix of every node record name in storage.
pub const RECORD_SUFFIX: &str = ".node";

/// Storage name of the root record.
pub const ROOT_KEY: &str = "root.node";

/// A 128-bit node identifier.
///
/// Identifiers are random (UUID v4) except for the root, which always uses the
/// nil UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// The identifier reserved for the root node.
    pub const ROOT: NodeId = NodeId(Uuid::nil());

    /// Generate a fresh random identifier.
    pub fn new_random() -> Self {
        NodeId(Uuid::new_v4())
    }

    /// Whether this is the reserved root identifier.
    pub fn is_root(&self) -> bool {
        self.0.is_nil()
    }

    /// Name of the storage record holding this node.
    pub fn storage_key(&self) -> String {
        if self.is_root() {
            ROOT_KEY.to_string()
        } else {
            format!("{}{RECORD_SUFFIX}", self.0.simple())
        }
    }

    /// Parse a storage record name back into an identifier.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        if key == ROOT_KEY {
            return Some(NodeId::ROOT);
        }
        let stem = key.strip_suffix(RECORD_SUFFIX)?;
        Uuid::try_parse(stem).ok().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NodeId {
    type Err = ClustreeError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::try_parse(s)
            .map(NodeId)
            .map_err(|e| ClustreeError::invalid_argument(format!("Invalid node id '{s}': {e}")))
    }
}

/// A single node of the cluster tree.
///
/// Leaves hold an inserted point. Interior nodes hold the centroid of their
/// immediate children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Position in the vector space.
    pub position: Vec<f32>,
    /// Child identifiers in insertion order.
    pub children: Vec<NodeId>,
    /// Bumped once per insertion that passes through this node.
    pub descendant_counter: u64,
}

impl Node {
    /// Create a childless node with a fresh identifier.
    pub fn new(position: Vec<f32>) -> Self {
        Self::with_id(NodeId::new_random(), position)
    }

    /// Create a childless node with the given identifier.
    pub fn with_id(id: NodeId, position: Vec<f32>) -> Self {
        Node {
            id,
            position,
            children: Vec::new(),
            descendant_counter: 0,
        }
    }

    /// Create an empty root positioned at the origin.
    pub fn root(dimension: usize) -> Self {
        Self::with_id(NodeId::ROOT, vec![0.0; dimension])
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Length of the position vector.
    pub fn dimension(&self) -> usize {
        self.position.len()
    }
}

/// A point to be inserted, with the identifier its leaf will carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: NodeId,
    pub position: Vec<f32>,
}

impl Point {
    /// Create a point with a fresh identifier.
    pub fn new(position: Vec<f32>) -> Self {
        Point {
            id: NodeId::new_random(),
            position,
        }
    }

    /// Create a point with a caller-chosen identifier.
    pub fn with_id(id: NodeId, position: Vec<f32>) -> Self {
        Point { id, position }
    }
}

impl From<Point> for Node {
    fn from(point: Point) -> Self {
        Node::with_id(point.id, point.position)
    }
}
