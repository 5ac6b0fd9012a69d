//! Whole-tree statistics and invariant checks.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{ClustreeError, Result};
use crate::tree::distance::centroid;
use crate::tree::node::{Node, NodeId};
use crate::tree::store::NodeStore;

/// Relative tolerance when comparing a node against its children's centroid.
const CENTROID_TOLERANCE: f32 = 1e-4;

/// Shape statistics of a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Nodes reachable from the root, root included.
    pub node_count: usize,
    /// Reachable nodes without children (the root excluded).
    pub leaf_count: usize,
    /// Number of layers on the deepest root-to-leaf path.
    pub depth: usize,
    /// Largest child list.
    pub max_fan_out: usize,
    /// Mean child-list length over interior nodes.
    pub mean_fan_out: f64,
    /// Total point count as reported by the root counter.
    pub point_count: u64,
}

/// A violated tree invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A child id without a backing record.
    DanglingChild { parent: NodeId, child: NodeId },
    /// A child list longer than `max_leafs`.
    FanOutExceeded {
        node: NodeId,
        children: usize,
        max_leafs: usize,
    },
    /// An interior node away from the mean of its children.
    CentroidDrift { node: NodeId, drift: f32 },
    /// A position whose length differs from the tree dimension.
    WrongDimension { node: NodeId, dimension: usize },
}

/// Result of a full invariant check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub nodes_checked: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Whether no invariant was violated.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Breadth-first traversal from the root, yielding each reachable node with its depth.
///
/// Dangling children are reported through `on_dangling` and not descended into.
fn walk<F, D>(store: &NodeStore, mut visit: F, mut on_dangling: D) -> Result<()>
where
    F: FnMut(&Node, usize, &[Node]),
    D: FnMut(NodeId, NodeId),
{
    let mut queue = VecDeque::new();
    queue.push_back((store.load(NodeId::ROOT)?, 1usize));

    while let Some((node, depth)) = queue.pop_front() {
        let mut children = Vec::with_capacity(node.children.len());
        for child_id in &node.children {
            match store.load(*child_id) {
                Ok(child) => children.push(child),
                Err(ClustreeError::NotFound(missing)) => on_dangling(node.id, missing),
                Err(e) => return Err(e),
            }
        }

        visit(&node, depth, &children);
        queue.extend(children.into_iter().map(|child| (child, depth + 1)));
    }

    Ok(())
}

/// Collect shape statistics.
pub fn collect_stats(store: &NodeStore, point_count: u64) -> Result<TreeStats> {
    let mut stats = TreeStats {
        point_count,
        ..Default::default()
    };
    let mut interior = 0usize;
    let mut edges = 0usize;

    walk(
        store,
        |node, depth, _| {
            stats.node_count += 1;
            stats.depth = stats.depth.max(depth);
            stats.max_fan_out = stats.max_fan_out.max(node.children.len());
            if node.is_leaf() {
                if !node.id.is_root() {
                    stats.leaf_count += 1;
                }
            } else {
                interior += 1;
                edges += node.children.len();
            }
        },
        |_, _| {},
    )?;

    if interior > 0 {
        stats.mean_fan_out = edges as f64 / interior as f64;
    }
    Ok(stats)
}

/// Check every reachable node against the tree invariants.
pub fn validate(store: &NodeStore, dimension: usize, max_leafs: usize) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let mut dangling = Vec::new();

    walk(
        store,
        |node, _, children| {
            report.nodes_checked += 1;

            if node.dimension() != dimension {
                report.violations.push(Violation::WrongDimension {
                    node: node.id,
                    dimension: node.dimension(),
                });
                return;
            }

            if node.children.len() > max_leafs {
                report.violations.push(Violation::FanOutExceeded {
                    node: node.id,
                    children: node.children.len(),
                    max_leafs,
                });
            }

            if !children.is_empty() && children.iter().all(|c| c.dimension() == dimension) {
                let center = centroid(children.iter().map(|c| c.position.as_slice()));
                let scale = center.iter().fold(1.0f32, |acc, v| acc.max(v.abs()));
                let drift = center
                    .iter()
                    .zip(&node.position)
                    .fold(0.0f32, |acc, (a, b)| acc.max((a - b).abs()));
                if drift > CENTROID_TOLERANCE * scale {
                    report
                        .violations
                        .push(Violation::CentroidDrift { node: node.id, drift });
                }
            }
        },
        |parent, child| dangling.push(Violation::DanglingChild { parent, child }),
    )?;

    report.violations.extend(dangling);
    Ok(report)
}
