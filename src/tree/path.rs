//! Greedy nearest-child descent.
//!
//! A [`Path`] is an ordered list of sibling layers: `path[0]` is `[root]` and
//! every following layer holds the children of the previous layer's first
//! node, sorted by ascending distance to the query. Only the nearest node of
//! each layer is expanded, so the descent is approximate.

use log::trace;

use crate::error::Result;
use crate::tree::distance::euclidean;
use crate::tree::node::{Node, NodeId};
use crate::tree::store::NodeStore;

/// A layer of sibling nodes.
pub type Layer = Vec<Node>;

/// Ordered sequence of sibling layers from the root downwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    layers: Vec<Layer>,
}

impl Path {
    /// A path consisting of the root layer only.
    pub fn from_root(root: Node) -> Self {
        Path {
            layers: vec![vec![root]],
        }
    }

    /// All layers, root first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the path has no layers at all.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether only the root layer is present (the tree holds no points).
    pub fn is_root_only(&self) -> bool {
        self.layers.len() == 1
    }

    /// The deepest layer.
    pub fn last_layer(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// The deepest layer, mutably.
    pub fn last_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.last_mut()
    }

    /// The first node of the second-to-last layer: the parent of the deepest layer.
    pub fn parent(&self) -> Option<&Node> {
        let depth = self.layers.len();
        if depth < 2 {
            return None;
        }
        self.layers.get(depth - 2).and_then(|layer| layer.first())
    }

    /// Mutable access to the parent of the deepest layer.
    pub fn parent_mut(&mut self) -> Option<&mut Node> {
        let depth = self.layers.len();
        if depth < 2 {
            return None;
        }
        self.layers.get_mut(depth - 2).and_then(|layer| layer.first_mut())
    }

    /// The nearest node of the deepest layer.
    pub fn nearest(&self) -> Option<&Node> {
        self.last_layer().and_then(|layer| layer.first())
    }

    pub(crate) fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub(crate) fn pop_layer(&mut self) -> Option<Layer> {
        self.layers.pop()
    }
}

/// Descends the tree along the locally nearest child.
#[derive(Debug, Clone, Copy)]
pub struct PathLocator<'a> {
    store: &'a NodeStore,
}

impl<'a> PathLocator<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        PathLocator { store }
    }

    /// Locate `query` starting from the root.
    pub fn locate(&self, query: &[f32]) -> Result<Path> {
        let root = self.store.load(NodeId::ROOT)?;
        let mut path = Path::from_root(root);
        self.resume(query, &mut path)?;
        Ok(path)
    }

    /// Extend `path` until its deepest layer is empty or led by a leaf.
    pub fn resume(&self, query: &[f32], path: &mut Path) -> Result<()> {
        loop {
            let children = match path.nearest() {
                Some(head) if !head.is_leaf() => head.children.clone(),
                _ => return Ok(()),
            };

            let layer = sort_by_distance(self.store.load_many(&children)?, query);
            trace!("descended to depth {} ({} siblings)", path.len(), layer.len());
            path.push_layer(layer);
        }
    }
}

/// Sort nodes by ascending distance to `query`, keeping ties in input order.
pub fn sort_by_distance(nodes: Vec<Node>, query: &[f32]) -> Layer {
    let mut scored: Vec<(f32, Node)> = nodes
        .into_iter()
        .map(|node| (euclidean(&node.position, query), node))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, node)| node).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::memory::MemoryStorage;

    /// Root with two clusters: (0,0) holding two leaves and (10,10) holding one.
    fn two_cluster_store() -> (NodeStore, Vec<NodeId>) {
        let store = NodeStore::new(Arc::new(MemoryStorage::new_default()), 0);

        let near_a = Node::new(vec![-1.0, 0.0]);
        let near_b = Node::new(vec![1.0, 0.0]);
        let far_leaf = Node::new(vec![10.0, 10.0]);

        let mut near = Node::new(vec![0.0, 0.0]);
        near.children = vec![near_a.id, near_b.id];
        let mut far = Node::new(vec![10.0, 10.0]);
        far.children = vec![far_leaf.id];

        let mut root = Node::root(2);
        root.children = vec![far.id, near.id];

        for node in [&near_a, &near_b, &far_leaf, &near, &far, &root] {
            store.save(node).unwrap();
        }

        let ids = vec![near.id, far.id, near_a.id, near_b.id, far_leaf.id];
        (store, ids)
    }

    #[test]
    fn test_empty_tree_path_is_root_only() {
        let store = NodeStore::new(Arc::new(MemoryStorage::new_default()), 0);
        store.save(&Node::root(2)).unwrap();

        let path = PathLocator::new(&store).locate(&[1.0, 1.0]).unwrap();
        assert!(path.is_root_only());
        assert!(path.parent().is_none());
    }

    #[test]
    fn test_descends_nearest_branch() {
        let (store, ids) = two_cluster_store();
        let path = PathLocator::new(&store).locate(&[0.9, 0.1]).unwrap();

        assert_eq!(path.len(), 3);
        assert_eq!(path.layers()[1][0].id, ids[0]);
        assert_eq!(path.layers()[1][1].id, ids[1]);
        // (1,0) is nearer to the query than (-1,0)
        assert_eq!(path.layers()[2][0].id, ids[3]);
        assert_eq!(path.layers()[2][1].id, ids[2]);
        assert_eq!(path.parent().unwrap().id, ids[0]);
    }

    #[test]
    fn test_last_layer_sorted() {
        let (store, _) = two_cluster_store();
        let query = [-3.0, 0.5];
        let path = PathLocator::new(&store).locate(&query).unwrap();

        let distances: Vec<f32> = path
            .last_layer()
            .unwrap()
            .iter()
            .map(|n| euclidean(&n.position, &query))
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_resume_stops_on_empty_layer() {
        let (store, _) = two_cluster_store();
        let mut path = PathLocator::new(&store).locate(&[0.0, 0.0]).unwrap();
        path.pop_layer();
        path.last_layer_mut().unwrap().clear();

        PathLocator::new(&store).resume(&[0.0, 0.0], &mut path).unwrap();
        assert_eq!(path.len(), 2);
        assert!(path.last_layer().unwrap().is_empty());
    }

    #[test]
    fn test_dangling_child_is_not_found() {
        let store = NodeStore::new(Arc::new(MemoryStorage::new_default()), 0);
        let mut root = Node::root(1);
        let missing = NodeId::new_random();
        root.children.push(missing);
        store.save(&root).unwrap();

        let err = PathLocator::new(&store).locate(&[0.0]).unwrap_err();
        assert!(matches!(err, crate::error::ClustreeError::NotFound(id) if id == missing));
    }
}
