//! Lineage tracer configuration

use serde::{Deserialize, Serialize};

/// Configuration for the lineage tracer
///
/// # Examples
///
/// ```
/// use prism_lineage::LineageConfig;
///
/// let config = LineageConfig::default();
/// assert_eq!(config.max_depth, 64);
/// assert_eq!(config.default_aggregation, "aggregate");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    /// Deepest chain of nodes a traversal may follow
    /// Default: 64
    pub max_depth: usize,

    /// Edge label for children that name no aggregation method
    /// Default: "aggregate"
    pub default_aggregation: String,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            default_aggregation: "aggregate".to_string(),
        }
    }
}

impl LineageConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be positive".to_string());
        }
        if self.default_aggregation.trim().is_empty() {
            return Err("default_aggregation must not be empty".to_string());
        }
        Ok(())
    }
}
