//! Error types for retrieval operations

use crate::embedding::EmbeddingError;
use thiserror::Error;

/// Errors that can occur while indexing or querying
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Query issued before the first index build completed
    #[error("Retrieval engine is not initialized")]
    NotInitialized,

    /// Embedding model failure
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Index build failure
    #[error("Indexing failed: {0}")]
    Indexing(String),

    /// Model produced a vector of the wrong size
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension produced
        actual: usize,
    },

    /// A finished build was not published
    #[error("Index generation {generation} was superseded before it could be published")]
    Superseded {
        /// Generation of the discarded build
        generation: u64,
    },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;
