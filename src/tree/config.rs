//! Configuration for cluster tree construction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClustreeError, Result};

fn default_max_leafs() -> usize {
    8
}

fn default_cache_capacity() -> usize {
    4096
}

/// Configuration for a [`ClusterTree`](crate::tree::ClusterTree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Length of every position vector.
    pub dimension: usize,
    /// Sibling count at which a layer gets a new level beneath it.
    #[serde(default = "default_max_leafs")]
    pub max_leafs: usize,
    /// Number of decoded nodes kept in memory (0 disables the cache).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            dimension: 2,
            max_leafs: default_max_leafs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl TreeConfig {
    /// Create a configuration for the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    /// Set the fan-out bound.
    pub fn with_max_leafs(mut self, max_leafs: usize) -> Self {
        self.max_leafs = max_leafs;
        self
    }

    /// Set the node cache capacity.
    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Check the parameters, failing with [`ClustreeError::Config`].
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(ClustreeError::config("dimension must be at least one"));
        }
        if self.max_leafs <= 1 {
            return Err(ClustreeError::config(format!(
                "max_leafs must be greater than one, got {}",
                self.max_leafs
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TreeConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
