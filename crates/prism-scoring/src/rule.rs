//! Scoring context and rule definitions
//!
//! Rules arrive from the host as plain data, so every type here round-trips
//! through serde.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A named input signal: numeric or categorical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Signal {
    /// Numeric signal (e.g. price sensitivity 0.7)
    Numeric(f64),
    /// Categorical signal (e.g. income band "high")
    Categorical(String),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Numeric(v) => write!(f, "{}", v),
            Signal::Categorical(c) => write!(f, "'{}'", c),
        }
    }
}

impl From<f64> for Signal {
    fn from(v: f64) -> Self {
        Signal::Numeric(v)
    }
}

impl From<&str> for Signal {
    fn from(v: &str) -> Self {
        Signal::Categorical(v.to_string())
    }
}

/// Persona signals keyed by name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoringContext {
    signals: BTreeMap<String, Signal>,
}

impl ScoringContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signal (builder style)
    pub fn with(mut self, name: impl Into<String>, signal: impl Into<Signal>) -> Self {
        self.insert(name, signal);
        self
    }

    /// Insert or replace a signal
    pub fn insert(&mut self, name: impl Into<String>, signal: impl Into<Signal>) {
        self.signals.insert(name.into(), signal.into());
    }

    /// Look up a signal
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    /// Number of signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the context has no signals
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// One weighted signal inside a linear expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    /// Signal name
    pub signal: String,

    /// Weight; a term list's weights must sum to 1.0
    pub weight: f64,

    /// Numeric value per category, required for categorical signals
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, f64>,
}

impl WeightedTerm {
    /// Create a term over a numeric signal
    pub fn new(signal: impl Into<String>, weight: f64) -> Self {
        Self {
            signal: signal.into(),
            weight,
            categories: BTreeMap::new(),
        }
    }

    /// Map a category to a numeric value
    pub fn with_category(mut self, category: impl Into<String>, value: f64) -> Self {
        self.categories.insert(category.into(), value);
        self
    }
}

/// Comparison operator used by conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Equal
    Eq,
    /// Not equal
    Ne,
}

/// A predicate over one signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Signal name
    pub signal: String,
    /// Operator
    pub op: Comparison,
    /// Value the signal is compared against
    pub threshold: Signal,
}

impl Condition {
    /// Create a condition
    pub fn new(signal: impl Into<String>, op: Comparison, threshold: impl Into<Signal>) -> Self {
        Self {
            signal: signal.into(),
            op,
            threshold: threshold.into(),
        }
    }
}

/// Terms applied when a condition holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Guard
    pub when: Condition,
    /// Weighted terms used when the guard holds
    pub terms: Vec<WeightedTerm>,
}

/// How a metric is computed from signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Expression {
    /// Weighted sum of signals
    Linear {
        /// Terms of the sum
        terms: Vec<WeightedTerm>,
    },
    /// First matching branch, else the fallback terms
    Conditional {
        /// Guarded branches, checked in order
        branches: Vec<Branch>,
        /// Terms used when no branch matches
        otherwise: Vec<WeightedTerm>,
    },
}

impl Expression {
    /// Every term list in this expression, with a label for error messages
    pub(crate) fn term_sets(&self) -> Vec<(String, &[WeightedTerm])> {
        match self {
            Expression::Linear { terms } => vec![("terms".to_string(), terms.as_slice())],
            Expression::Conditional { branches, otherwise } => {
                let mut sets: Vec<(String, &[WeightedTerm])> = branches
                    .iter()
                    .enumerate()
                    .map(|(i, b)| (format!("branch {}", i), b.terms.as_slice()))
                    .collect();
                sets.push(("otherwise".to_string(), otherwise.as_slice()));
                sets
            }
        }
    }
}

/// A metric definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Metric produced by this rule
    pub metric: String,
    /// Expression producing the value
    pub expression: Expression,
}

impl Rule {
    /// Create a linear rule
    pub fn linear(metric: impl Into<String>, terms: Vec<WeightedTerm>) -> Self {
        Self {
            metric: metric.into(),
            expression: Expression::Linear { terms },
        }
    }

    /// Create a conditional rule
    pub fn conditional(
        metric: impl Into<String>,
        branches: Vec<Branch>,
        otherwise: Vec<WeightedTerm>,
    ) -> Self {
        Self {
            metric: metric.into(),
            expression: Expression::Conditional { branches, otherwise },
        }
    }
}

/// Ordered rules; output metrics follow this order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a rule set
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule (builder style)
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Iterate the rules in order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rule-only or hybrid evaluation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ScoringMode {
    /// Deterministic rule score only
    #[default]
    Rule,
    /// Blend rule scores with externally supplied model scores
    Hybrid {
        /// Model-derived score per metric
        model_scores: BTreeMap<String, f64>,
        /// Weight of the rule score in [0, 1]; config default when absent
        #[serde(default)]
        mix_ratio: Option<f64>,
    },
}
