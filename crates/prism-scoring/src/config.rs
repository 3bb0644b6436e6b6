//! Scoring engine configuration

use serde::{Deserialize, Serialize};

/// Configuration for the scoring engine
///
/// # Examples
///
/// ```
/// use prism_scoring::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// assert_eq!(config.weight_tolerance, 0.01);
/// assert_eq!(config.default_mix_ratio, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Allowed deviation of a weight set's sum from 1.0
    /// Default: 0.01
    pub weight_tolerance: f64,

    /// Weight of the rule score in hybrid mode when the caller gives none
    /// Default: 0.5 (equal blend)
    pub default_mix_ratio: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: 0.01,
            default_mix_ratio: 0.5,
        }
    }
}

impl ScoringConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.weight_tolerance >= 0.0 && self.weight_tolerance < 1.0) {
            return Err(format!(
                "weight_tolerance must be in [0.0, 1.0), got {}",
                self.weight_tolerance
            ));
        }
        if !(0.0..=1.0).contains(&self.default_mix_ratio) {
            return Err(format!(
                "default_mix_ratio must be in [0.0, 1.0], got {}",
                self.default_mix_ratio
            ));
        }
        Ok(())
    }
}
