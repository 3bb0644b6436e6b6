//! Retrieval engine configuration

use serde::{Deserialize, Serialize};

/// Configuration for the retrieval engine
///
/// # Examples
///
/// ```
/// use prism_retrieval::RetrievalConfig;
///
/// let config = RetrievalConfig::default();
/// assert_eq!(config.dimension, 384);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Embedding dimension (bucket count of the hashing model)
    /// Default: 384
    pub dimension: usize,

    /// Number of documents returned when the caller gives no `top_k`
    /// Default: 5
    pub default_top_k: usize,

    /// Records embedded per blocking task
    /// Default: 256
    pub batch_size: usize,

    /// Maximum characters of document text quoted in a source
    /// Default: 160
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            default_top_k: 5,
            batch_size: 256,
            snippet_chars: 160,
        }
    }
}

impl RetrievalConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("dimension must be positive".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be positive".to_string());
        }
        if self.default_top_k == 0 {
            return Err("default_top_k must be positive".to_string());
        }
        Ok(())
    }
}
