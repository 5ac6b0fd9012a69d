//! Error types for the Clustree library.
//!
//! All errors are represented by the [`ClustreeError`] enum. Validation errors
//! (`Config`, `DimensionMismatch`) are always raised before the tree is
//! mutated; storage failures are propagated verbatim.
//!
//! # Examples
//!
//! ```
//! use clustree::error::{ClustreeError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ClustreeError::config("max_leafs must be greater than one"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::tree::node::NodeId;

/// The main error type for Clustree operations.
#[derive(Error, Debug)]
pub enum ClustreeError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid construction parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// A vector's length disagrees with the index dimensionality
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A referenced node has no backing record
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Record encoding, decoding or checksum errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with ClustreeError.
pub type Result<T> = std::result::Result<T, ClustreeError>;

impl ClustreeError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ClustreeError::Config(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        ClustreeError::DimensionMismatch { expected, actual }
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ClustreeError::Storage(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        ClustreeError::Serialization(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ClustreeError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ClustreeError::Other(msg.into())
    }
}

impl From<bincode::Error> for ClustreeError {
    fn from(err: bincode::Error) -> Self {
        ClustreeError::Serialization(err.to_string())
    }
}
