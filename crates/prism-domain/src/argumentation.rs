//! Argumentation records (evidence, logic chains and data sources)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strength label attached to a metric node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthLabel {
    /// Score of at least 70
    Strong,
    /// Score of at least 40
    Moderate,
    /// Anything below 40
    #[default]
    Weak,
}

impl StrengthLabel {
    /// Get the label as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLabel::Strong => "strong",
            StrengthLabel::Moderate => "moderate",
            StrengthLabel::Weak => "weak",
        }
    }
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of supporting datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportingDataKind {
    /// A summary statistic
    Statistic,
    /// A verbatim persona quote
    Quote,
    /// A correlation between two signals
    Correlation,
    /// A movement over time
    Trend,
}

/// A single item backing an evidence claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingData {
    /// Kind of datum
    #[serde(rename = "type")]
    pub kind: SupportingDataKind,

    /// Numeric or textual value
    pub value: serde_json::Value,

    /// Where the datum came from
    pub source: String,

    /// Samples behind the datum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
}

/// A claim together with the data supporting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// The claim being supported
    pub claim: String,

    /// Data supporting the claim
    #[serde(default)]
    pub supporting_data: Vec<SupportingData>,

    /// Host-assigned strength [0, 100]
    #[serde(default)]
    pub strength: u8,
}

/// Kind of aggregated data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// Answers to a survey question
    Question,
    /// Interview transcripts
    Interview,
    /// Simulated persona responses
    Simulation,
    /// Transaction records
    Transaction,
}

/// Inclusive collection window in ms since epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First collection timestamp
    pub start: u64,
    /// Last collection timestamp
    pub end: u64,
}

impl DateRange {
    /// Create a new range
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// An aggregated source of responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// Source identifier
    pub id: String,

    /// Kind of source
    #[serde(rename = "type")]
    pub kind: DataSourceKind,

    /// Question text, for question sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// Number of responses collected
    #[serde(default)]
    pub response_count: u64,

    /// Collection window
    pub date_range: DateRange,
}

impl DataSource {
    /// Create a new data source
    pub fn new(
        id: impl Into<String>,
        kind: DataSourceKind,
        response_count: u64,
        date_range: DateRange,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            question: None,
            response_count,
            date_range,
        }
    }

    /// Attach the question text
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }
}

/// Premises, reasoning and conclusion behind a metric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicChain {
    /// Premises the reasoning starts from
    #[serde(default)]
    pub premise: Vec<String>,

    /// Reasoning text
    #[serde(default)]
    pub reasoning: String,

    /// Conclusion drawn
    #[serde(default)]
    pub conclusion: String,

    /// Competing explanations worth considering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_explanations: Option<Vec<String>>,
}

/// Evidence grading attached to a metric node
///
/// Always derived by the calculator; never edited independently of its node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argumentation {
    /// Strength label
    #[serde(default)]
    pub strength: StrengthLabel,

    /// Evidence items
    #[serde(default)]
    pub evidence: Vec<Evidence>,

    /// Logic chain
    #[serde(default)]
    pub logic: LogicChain,

    /// Confidence [0, 100]
    #[serde(default)]
    pub confidence: u8,

    /// Aggregated sources
    #[serde(default)]
    pub sources: Vec<DataSource>,
}

impl Argumentation {
    /// Inputs needed to recompute this argumentation
    pub fn to_partial(&self) -> PartialArgumentation {
        PartialArgumentation {
            evidence: self.evidence.clone(),
            logic: Some(self.logic.clone()),
            sources: self.sources.clone(),
        }
    }
}

/// Calculator input; every field may be absent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialArgumentation {
    /// Evidence items
    #[serde(default)]
    pub evidence: Vec<Evidence>,

    /// Logic chain (absent scores the 50-point baseline)
    #[serde(default)]
    pub logic: Option<LogicChain>,

    /// Aggregated sources
    #[serde(default)]
    pub sources: Vec<DataSource>,
}
