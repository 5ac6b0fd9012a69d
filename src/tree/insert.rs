//! Point insertion and depth extension.
//!
//! A new point joins the sibling layer its path resolves to. When that layer
//! reaches `max_leafs` members, every member receives one new child carrying a
//! copy of its position, which adds a level beneath the whole sibling group
//! instead of splitting it across parents. Centroids are then propagated up
//! the path.

use log::debug;

use crate::error::{ClustreeError, Result};
use crate::tree::node::{Node, NodeId, Point};
use crate::tree::path::PathLocator;
use crate::tree::propagate::propagate;
use crate::tree::store::NodeStore;

/// Inserts points into a tree held by a [`NodeStore`].
#[derive(Debug, Clone, Copy)]
pub struct Inserter<'a> {
    store: &'a NodeStore,
    dimension: usize,
    max_leafs: usize,
}

impl<'a> Inserter<'a> {
    pub fn new(store: &'a NodeStore, dimension: usize, max_leafs: usize) -> Self {
        Inserter {
            store,
            dimension,
            max_leafs,
        }
    }

    /// Insert `point` and return its identifier.
    pub fn insert(&self, point: Point) -> Result<NodeId> {
        if point.position.len() != self.dimension {
            return Err(ClustreeError::dimension_mismatch(
                self.dimension,
                point.position.len(),
            ));
        }
        if point.position.iter().any(|v| !v.is_finite()) {
            return Err(ClustreeError::invalid_argument("Point coordinates must be finite"));
        }
        if point.id.is_root() || self.store.exists(point.id) {
            return Err(ClustreeError::invalid_argument(format!(
                "Node id {} is already in use",
                point.id
            )));
        }

        let mut path = PathLocator::new(self.store).locate(&point.position)?;
        let node = Node::from(point);
        let id = node.id;

        if path.is_root_only() {
            path.push_layer(vec![node.clone()]);
        } else if let Some(layer) = path.last_layer_mut() {
            layer.insert(0, node.clone());
        }

        self.store.save(&node)?;

        let parent = path
            .parent_mut()
            .ok_or_else(|| ClustreeError::other("Insertion path has no parent layer"))?;
        parent.children.push(id);
        parent.descendant_counter += 1;
        self.store.save(parent)?;

        if let Some(layer) = path.last_layer_mut()
            && layer.len() >= self.max_leafs
        {
            self.extend_depth(layer)?;
        }

        propagate(self.store, &mut path)?;
        Ok(id)
    }

    /// Give every member of an overflowing layer a single child at its own position.
    fn extend_depth(&self, layer: &mut [Node]) -> Result<()> {
        debug!("extending depth beneath {} siblings", layer.len());

        for member in layer.iter_mut() {
            let copy = Node::new(member.position.clone());
            member.children = vec![copy.id];
            member.descendant_counter = 1;

            self.store.save(&copy)?;
            self.store.save(member)?;
        }

        Ok(())
    }
}
