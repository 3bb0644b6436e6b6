//! Error types for the analytics session

use crate::config::ConfigError;
use prism_domain::DomainError;
use prism_lineage::LineageError;
use prism_retrieval::RetrievalError;
use prism_scoring::ValidationError;
use thiserror::Error;

/// Errors surfaced by [`crate::AnalyticsSession`]
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Hierarchy failed level validation
    #[error("Invalid hierarchy: {0}")]
    Domain(#[from] DomainError),

    /// Scoring rejected the rules or context
    #[error("Scoring failed: {0}")]
    Scoring(#[from] ValidationError),

    /// Retrieval failure
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Lineage failure
    #[error(transparent)]
    Lineage(#[from] LineageError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Operation needs a hierarchy but none is loaded
    #[error("No metric hierarchy loaded")]
    NoHierarchy,

    /// Tracing subscriber could not be installed
    #[error("Failed to initialize tracing: {0}")]
    Telemetry(String),
}

/// Result type alias for session operations
pub type PipelineResult<T> = Result<T, PipelineError>;
