//! The public cluster tree handle.

use std::path::Path as FsPath;
use std::sync::Arc;

use log::{debug, info};

use crate::error::{ClustreeError, Result};
use crate::storage::file::FileStorageConfig;
use crate::storage::{self, Storage, StorageConfig, StorageFactory};
use crate::tree::codec;
use crate::tree::config::TreeConfig;
use crate::tree::insert::Inserter;
use crate::tree::nearest::Nearest;
use crate::tree::node::{Node, NodeId, Point, ROOT_KEY};
use crate::tree::path::{Path, PathLocator};
use crate::tree::stats::{self, TreeStats, ValidationReport};
use crate::tree::store::NodeStore;

/// A persistent hierarchy of clusters supporting incremental insertion and
/// approximate nearest-neighbor queries.
///
/// # Example
///
/// ```
/// use clustree::tree::{ClusterTree, TreeConfig};
/// use clustree::storage::StorageConfig;
///
/// # fn main() -> clustree::error::Result<()> {
/// let mut tree = ClusterTree::with_config(StorageConfig::default(), TreeConfig::new(2))?;
/// tree.insert(&[10.0, 10.0])?;
///
/// let nearest = tree.nearest(&[10.0, 10.0], 1)?.next().unwrap()?;
/// assert_eq!(nearest.position, vec![10.0, 10.0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ClusterTree {
    store: NodeStore,
    config: TreeConfig,
}

impl ClusterTree {
    /// Open (or create) a file-backed tree in `path`.
    pub fn open<P: AsRef<FsPath>>(path: P, dimension: usize, max_leafs: usize) -> Result<Self> {
        let config = TreeConfig::new(dimension).with_max_leafs(max_leafs);
        Self::with_config(StorageConfig::File(FileStorageConfig::new(path)), config)
    }

    /// Open (or create) a tree on the storage described by `storage_config`.
    pub fn with_config(storage_config: StorageConfig, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let storage = StorageFactory::create(storage_config)?;
        Self::with_storage(storage, config)
    }

    /// Open (or create) a tree on an existing storage instance.
    pub fn with_storage(storage: Arc<dyn Storage>, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let store = NodeStore::new(storage, config.cache_capacity);

        if store.exists(NodeId::ROOT) {
            let root = store.load(NodeId::ROOT)?;
            if root.dimension() != config.dimension {
                return Err(ClustreeError::dimension_mismatch(
                    config.dimension,
                    root.dimension(),
                ));
            }
            debug!(
                "opened tree: dimension {}, max_leafs {}",
                config.dimension, config.max_leafs
            );
        } else {
            store.save(&Node::root(config.dimension))?;
            info!(
                "created tree: dimension {}, max_leafs {}",
                config.dimension, config.max_leafs
            );
        }

        Ok(ClusterTree { store, config })
    }

    /// Dimension recorded by an existing tree on `storage`, if any.
    pub fn stored_dimension(storage: &dyn Storage) -> Result<Option<usize>> {
        if !storage.file_exists(ROOT_KEY) {
            return Ok(None);
        }
        let root = codec::decode(&storage::read_all(storage, ROOT_KEY)?)?;
        Ok(Some(root.dimension()))
    }

    /// The tree configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Length of every position vector.
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Fan-out bound.
    pub fn max_leafs(&self) -> usize {
        self.config.max_leafs
    }

    fn check_dimension(&self, position: &[f32]) -> Result<()> {
        if position.len() != self.config.dimension {
            return Err(ClustreeError::dimension_mismatch(
                self.config.dimension,
                position.len(),
            ));
        }
        Ok(())
    }

    /// Insert a point with a fresh identifier.
    pub fn insert(&mut self, position: &[f32]) -> Result<NodeId> {
        self.insert_point(Point::new(position.to_vec()))
    }

    /// Insert a point carrying a caller-chosen identifier.
    pub fn insert_point(&mut self, point: Point) -> Result<NodeId> {
        Inserter::new(&self.store, self.config.dimension, self.config.max_leafs).insert(point)
    }

    /// The greedy descent path for `position`.
    pub fn locate(&self, position: &[f32]) -> Result<Path> {
        self.check_dimension(position)?;
        PathLocator::new(&self.store).locate(position)
    }

    /// Points ordered by approximate proximity to `position`, at most `k` of them.
    pub fn nearest(&self, position: &[f32], k: usize) -> Result<Nearest<'_>> {
        self.check_dimension(position)?;
        Ok(Nearest::new(&self.store, position.to_vec(), k))
    }

    /// The cluster `position` falls into: the parent of its located leaf layer.
    ///
    /// Returns `None` while the tree holds no points.
    pub fn region(&self, position: &[f32]) -> Result<Option<NodeId>> {
        let path = self.locate(position)?;
        Ok(path.parent().map(|node| node.id))
    }

    /// Total number of inserted points.
    ///
    /// Derived from the root counter: every insertion advances it by one, plus
    /// one more while the root is the direct parent of the new point, which
    /// happens exactly once per root child.
    pub fn count(&self) -> Result<u64> {
        let root = self.root()?;
        Ok(root
            .descendant_counter
            .saturating_sub(root.children.len() as u64))
    }

    /// Load a node by identifier.
    pub fn node(&self, id: NodeId) -> Result<Node> {
        self.store.load(id)
    }

    /// Load the root node.
    pub fn root(&self) -> Result<Node> {
        self.store.load(NodeId::ROOT)
    }

    /// Shape statistics gathered by walking the whole tree.
    pub fn stats(&self) -> Result<TreeStats> {
        stats::collect_stats(&self.store, self.count()?)
    }

    /// Check every reachable node against the tree invariants.
    pub fn validate(&self) -> Result<ValidationReport> {
        stats::validate(&self.store, self.config.dimension, self.config.max_leafs)
    }

    /// Number of node records in storage, root included.
    pub fn record_count(&self) -> Result<usize> {
        self.store.record_count()
    }

    /// Make every saved node durable in the backing storage.
    pub fn flush(&self) -> Result<()> {
        self.store.sync()
    }
}
