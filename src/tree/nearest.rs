//! Lazy nearest-neighbor enumeration with backtracking.
//!
//! [`Nearest`] yields the leaves of the located layer in ascending distance,
//! then backtracks: it drops the exhausted layer, removes the branch it came
//! from, and descends again into the next-nearest sibling. Results are sorted
//! within each explored layer only.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::distance::euclidean;
use crate::tree::node::{Node, NodeId};
use crate::tree::path::{Path, PathLocator};
use crate::tree::store::NodeStore;

/// A point returned by a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: NodeId,
    pub position: Vec<f32>,
    /// Euclidean distance to the query.
    pub distance: f32,
}

impl Neighbor {
    fn from_node(node: &Node, query: &[f32]) -> Self {
        Neighbor {
            id: node.id,
            position: node.position.clone(),
            distance: euclidean(&node.position, query),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    /// Run the locator from the retained path (or the root).
    Descend,
    /// Yield from the deepest layer, starting at `cursor`.
    Yield { cursor: usize },
    Done,
}

/// Iterator over points ordered by approximate proximity to a query.
#[derive(Debug)]
pub struct Nearest<'a> {
    locator: PathLocator<'a>,
    store: &'a NodeStore,
    query: Vec<f32>,
    path: Option<Path>,
    remaining: usize,
    state: State,
}

impl<'a> Nearest<'a> {
    /// Enumerate at most `limit` points around `query`.
    pub fn new(store: &'a NodeStore, query: Vec<f32>, limit: usize) -> Self {
        Nearest {
            locator: PathLocator::new(store),
            store,
            query,
            path: None,
            remaining: limit,
            state: State::Descend,
        }
    }

    /// Number of points this enumerator may still yield.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn descend(&mut self) -> Result<bool> {
        let mut path = match self.path.take() {
            Some(path) => path,
            None => Path::from_root(self.store.load(NodeId::ROOT)?),
        };
        self.locator.resume(&self.query, &mut path)?;

        let exhausted = path.is_root_only();
        self.path = Some(path);
        Ok(!exhausted)
    }

    /// Drop the exhausted layer and the branch that led to it.
    fn backtrack(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.pop_layer();
            if let Some(layer) = path.last_layer_mut()
                && !layer.is_empty()
            {
                layer.remove(0);
            }
        }
    }
}

impl Iterator for Nearest<'_> {
    type Item = Result<Neighbor>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == 0 {
                self.state = State::Done;
            }

            match self.state {
                State::Done => return None,
                State::Descend => match self.descend() {
                    Ok(true) => self.state = State::Yield { cursor: 0 },
                    Ok(false) => self.state = State::Done,
                    Err(e) => {
                        self.state = State::Done;
                        return Some(Err(e));
                    }
                },
                State::Yield { cursor } => {
                    let node = self
                        .path
                        .as_ref()
                        .and_then(|path| path.last_layer())
                        .and_then(|layer| layer.get(cursor));

                    match node {
                        Some(node) => {
                            let neighbor = Neighbor::from_node(node, &self.query);
                            self.state = State::Yield { cursor: cursor + 1 };
                            self.remaining -= 1;
                            return Some(Ok(neighbor));
                        }
                        None => {
                            self.backtrack();
                            self.state = State::Descend;
                        }
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            State::Done => (0, Some(0)),
            _ => (0, Some(self.remaining)),
        }
    }
}
