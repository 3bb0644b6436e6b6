//! Session configuration loaded from TOML
//!
//! Every section is optional; missing keys fall back to their defaults.
//!
//! ```toml
//! [scoring]
//! weight_tolerance = 0.01
//!
//! [retrieval]
//! dimension = 384
//! batch_size = 256
//!
//! [lineage]
//! max_depth = 64
//!
//! [session]
//! strict_levels = true
//!
//! [logging]
//! level = "info"
//! ```

use prism_domain::ArgumentationConfig;
use prism_lineage::LineageConfig;
use prism_retrieval::RetrievalConfig;
use prism_scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Log levels accepted in `[logging]`
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A section holds an invalid value
    #[error("Invalid [{section}] configuration: {message}")]
    Invalid {
        /// Offending section
        section: &'static str,
        /// What is wrong
        message: String,
    },
}

/// Session behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reject hierarchies whose levels are inconsistent
    /// Default: true
    pub strict_levels: bool,

    /// Add one retrieval document per metric node on `initialize`
    /// Default: true
    pub index_metrics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strict_levels: true,
            index_metrics: true,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when `PRISM_LOG` is unset
    /// Default: "info"
    pub level: String,

    /// Include the event target (module path) in each line
    /// Default: false
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

/// Complete configuration for an analytics session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    /// Scoring engine settings
    pub scoring: ScoringConfig,
    /// Argumentation recency thresholds
    pub argumentation: ArgumentationConfig,
    /// Retrieval engine settings
    pub retrieval: RetrievalConfig,
    /// Lineage tracer settings
    pub lineage: LineageConfig,
    /// Session behaviour
    pub session: SessionConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl PrismConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PrismConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate().map_err(invalid("scoring"))?;
        self.retrieval.validate().map_err(invalid("retrieval"))?;
        self.lineage.validate().map_err(invalid("lineage"))?;

        let a = &self.argumentation;
        if !(a.fresh_days >= 0.0 && a.fresh_days <= a.recent_days) {
            return Err(ConfigError::Invalid {
                section: "argumentation",
                message: format!(
                    "fresh_days ({}) must be non-negative and not exceed recent_days ({})",
                    a.fresh_days, a.recent_days
                ),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                section: "logging",
                message: format!(
                    "unknown level '{}' (expected one of {})",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

fn invalid(section: &'static str) -> impl Fn(String) -> ConfigError {
    move |message| ConfigError::Invalid { section, message }
}
