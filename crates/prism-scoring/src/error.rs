//! Validation errors raised by the scoring engine

use thiserror::Error;

/// Errors that can occur while evaluating rules
///
/// Every variant indicates malformed input from upstream. None of them is
/// recovered from silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A rule references a signal absent from the context
    #[error("Metric '{metric}' references missing signal '{signal}'")]
    MissingSignal {
        /// Metric being evaluated
        metric: String,
        /// Missing signal name
        signal: String,
    },

    /// A weight set does not sum to 1.0 within tolerance
    #[error("Weights for metric '{metric}' ({set}) sum to {sum}, expected 1.0 ± {tolerance}")]
    WeightSum {
        /// Metric being validated
        metric: String,
        /// Which term list failed
        set: String,
        /// Actual sum
        sum: f64,
        /// Allowed deviation
        tolerance: f64,
    },

    /// A term list has no terms
    #[error("Metric '{metric}' has an empty term list ({set})")]
    EmptyTerms {
        /// Metric being validated
        metric: String,
        /// Which term list is empty
        set: String,
    },

    /// A categorical signal value has no numeric mapping
    #[error("Metric '{metric}': category '{category}' of signal '{signal}' has no numeric mapping")]
    UnmappedCategory {
        /// Metric being evaluated
        metric: String,
        /// Signal name
        signal: String,
        /// Category value found in the context
        category: String,
    },

    /// A condition compares incompatible values
    #[error("Metric '{metric}': invalid comparison on signal '{signal}': {reason}")]
    InvalidComparison {
        /// Metric being evaluated
        metric: String,
        /// Signal name
        signal: String,
        /// What is wrong
        reason: String,
    },

    /// Two rules produce the same metric
    #[error("Duplicate metric '{0}' in rule set")]
    DuplicateMetric(String),

    /// Hybrid mixing ratio outside [0, 1]
    #[error("Mixing ratio {0} is outside [0.0, 1.0]")]
    MixRatioOutOfRange(f64),

    /// Hybrid mode without a model score for a metric
    #[error("Hybrid mode has no model score for metric '{0}'")]
    MissingModelScore(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for scoring operations
pub type ScoringResult<T> = Result<T, ValidationError>;
