//! Centroid propagation from an insertion point up to the root.

use log::trace;

use crate::error::{ClustreeError, Result};
use crate::tree::distance::centroid;
use crate::tree::path::Path;
use crate::tree::store::NodeStore;

/// Walk `path` bottom-up, moving every parent to the mean of the layer below it.
///
/// Each parent's descendant counter advances by one and the parent is
/// persisted. Layers are dropped as they are consumed, so on return the path
/// holds only the root layer. Nodes outside the path are never touched.
pub fn propagate(store: &NodeStore, path: &mut Path) -> Result<()> {
    while path.len() >= 2 {
        let Some(layer) = path.pop_layer() else {
            break;
        };
        let center = centroid(layer.iter().map(|node| node.position.as_slice()));

        let parent = path
            .last_layer_mut()
            .and_then(|layer| layer.first_mut())
            .ok_or_else(|| ClustreeError::other("Cannot propagate into an empty layer"))?;

        if !center.is_empty() {
            parent.position = center;
        }
        parent.descendant_counter += 1;
        store.save(parent)?;

        trace!(
            "propagated centroid to {} (counter {})",
            parent.id, parent.descendant_counter
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::tree::node::{Node, NodeId};

    #[test]
    fn test_updates_every_ancestor() {
        let store = NodeStore::new(Arc::new(MemoryStorage::new_default()), 0);

        let leaves = vec![Node::new(vec![2.0, 0.0]), Node::new(vec![4.0, 2.0])];
        let mut mid = Node::new(vec![0.0, 0.0]);
        mid.children = leaves.iter().map(|n| n.id).collect();
        let sibling = Node::new(vec![10.0, 10.0]);
        let mut root = Node::root(2);
        root.children = vec![mid.id, sibling.id];

        let mut path = Path::from_root(root);
        path.push_layer(vec![mid.clone(), sibling.clone()]);
        path.push_layer(leaves);

        propagate(&store, &mut path).unwrap();
        assert!(path.is_root_only());

        let mid = store.load(mid.id).unwrap();
        assert_eq!(mid.position, vec![3.0, 1.0]);
        assert_eq!(mid.descendant_counter, 1);

        let root = store.load(NodeId::ROOT).unwrap();
        assert_eq!(root.position, vec![6.5, 5.5]);
        assert_eq!(root.descendant_counter, 1);

        // Siblings off the path are not rewritten
        assert!(!store.exists(sibling.id));
    }

    #[test]
    fn test_root_only_path_is_untouched() {
        let store = NodeStore::new(Arc::new(MemoryStorage::new_default()), 0);
        let mut path = Path::from_root(Node::root(2));

        propagate(&store, &mut path).unwrap();
        assert!(!store.exists(NodeId::ROOT));
    }
}
