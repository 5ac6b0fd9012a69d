//! Node store adapter over a [`Storage`] backend.
//!
//! Nodes are read by value: every `load` returns an owned copy, and callers
//! persist their modified copy with `save`. A bounded write-through cache
//! keeps recently used nodes decoded.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::{ClustreeError, Result};
use crate::storage::{self, Storage};
use crate::tree::codec;
use crate::tree::node::{Node, NodeId};

/// Persistent node store.
#[derive(Debug)]
pub struct NodeStore {
    storage: Arc<dyn Storage>,
    cache: Mutex<NodeCache>,
}

#[derive(Debug)]
struct NodeCache {
    capacity: usize,
    entries: AHashMap<NodeId, Node>,
}

impl NodeCache {
    fn new(capacity: usize) -> Self {
        NodeCache {
            capacity,
            entries: AHashMap::with_capacity(capacity.min(1024)),
        }
    }

    fn get(&self, id: &NodeId) -> Option<Node> {
        self.entries.get(id).cloned()
    }

    fn put(&mut self, node: &Node) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&node.id) {
            // The root is read by every operation, so it stays resident.
            match self.entries.keys().find(|id| !id.is_root()).copied() {
                Some(victim) => {
                    self.entries.remove(&victim);
                }
                None => return,
            }
        }

        match self.entries.get_mut(&node.id) {
            Some(entry) => entry.clone_from(node),
            None => {
                self.entries.insert(node.id, node.clone());
            }
        }
    }
}

impl NodeStore {
    /// Create a store over `storage` caching at most `cache_capacity` nodes.
    pub fn new(storage: Arc<dyn Storage>, cache_capacity: usize) -> Self {
        NodeStore {
            storage,
            cache: Mutex::new(NodeCache::new(cache_capacity)),
        }
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Load a node, failing with [`ClustreeError::NotFound`] if it has no record.
    pub fn load(&self, id: NodeId) -> Result<Node> {
        if let Some(node) = self.cache.lock().get(&id) {
            return Ok(node);
        }

        let key = id.storage_key();
        if !self.storage.file_exists(&key) {
            return Err(ClustreeError::NotFound(id));
        }

        let node = codec::decode(&storage::read_all(self.storage.as_ref(), &key)?)?;
        if node.id != id {
            return Err(ClustreeError::serialization(format!(
                "Record {key} holds node {}",
                node.id
            )));
        }

        self.cache.lock().put(&node);
        Ok(node)
    }

    /// Load several nodes, preserving the order of `ids`.
    pub fn load_many(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        ids.iter().map(|id| self.load(*id)).collect()
    }

    /// Persist a node, overwriting any previous record.
    pub fn save(&self, node: &Node) -> Result<()> {
        let record = codec::encode(node)?;
        storage::write_all(self.storage.as_ref(), &node.id.storage_key(), &record)?;
        self.cache.lock().put(node);
        Ok(())
    }

    /// Whether a record exists for `id`.
    pub fn exists(&self, id: NodeId) -> bool {
        self.cache.lock().entries.contains_key(&id) || self.storage.file_exists(&id.storage_key())
    }

    /// Number of node records in storage.
    pub fn record_count(&self) -> Result<usize> {
        Ok(self
            .storage
            .list_files()?
            .iter()
            .filter(|name| NodeId::from_storage_key(name).is_some())
            .count())
    }

    /// Make every saved record durable in the backend.
    pub fn sync(&self) -> Result<()> {
        self.storage.sync()
    }
}
