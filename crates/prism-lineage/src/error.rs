//! Error types for lineage operations

use thiserror::Error;

/// Errors that can occur while tracing lineage
///
/// These indicate malformed or mismatched input and are always surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineageError {
    /// No node with this id exists
    #[error("Node not found: {0}")]
    NotFound(String),

    /// A node id repeats on its own ancestor chain
    #[error("Cycle detected at node '{id}' (path: {})", .path.join(" -> "))]
    CycleDetected {
        /// Repeated id
        id: String,
        /// Ancestor chain leading back to it
        path: Vec<String>,
    },

    /// A traversal went deeper than allowed
    #[error("Depth limit of {max_depth} exceeded at node '{id}'")]
    DepthLimitExceeded {
        /// Node at which the limit was hit
        id: String,
        /// Configured limit
        max_depth: usize,
    },

    /// Invalid tracer configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for lineage operations
pub type LineageResult<T> = Result<T, LineageError>;
