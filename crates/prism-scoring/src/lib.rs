//! Prism Scoring Engine
//!
//! Turns persona context into metric values using weighted linear or
//! conditional rules. Hybrid mode blends the rule score with a model score
//! supplied by the caller.
//!
//! ## Guarantees
//!
//! - Rule weights are validated before any evaluation
//! - Missing signals surface as [`ValidationError`], never as a default
//! - Identical input always produces identical output

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod engine;
mod error;
pub mod rule;

pub use config::ScoringConfig;
pub use engine::{Contribution, MetricScore, ModeKind, ScoredBatch, ScoredResult, ScoringEngine};
pub use error::{ScoringResult, ValidationError};
pub use rule::{
    Branch, Comparison, Condition, Expression, Rule, RuleSet, ScoringContext, ScoringMode, Signal,
    WeightedTerm,
};
