//! Leaf-level evidence records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of raw source a data point was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Structured questionnaire answers
    Survey,
    /// Free-form interview transcripts
    Interview,
    /// Simulated persona responses
    Simulation,
    /// Observed purchase or usage transactions
    Transaction,
}

impl SourceType {
    /// Get the source type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Survey => "survey",
            SourceType::Interview => "interview",
            SourceType::Simulation => "simulation",
            SourceType::Transaction => "transaction",
        }
    }

    /// Parse a source type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "survey" => Some(SourceType::Survey),
            "interview" => Some(SourceType::Interview),
            "simulation" => Some(SourceType::Simulation),
            "transaction" => Some(SourceType::Transaction),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid source type: {}", s))
    }
}

/// A single piece of leaf evidence
///
/// Data points are immutable once created; builders consume `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    /// Source identifier (e.g. "survey:q3", "persona:budget-shopper")
    pub source: String,

    /// Kind of source
    pub source_type: SourceType,

    /// Number of samples behind this data point (absent counts as one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,

    /// When the data was collected (ms since epoch)
    #[serde(default)]
    pub timestamp: u64,

    /// Free-form host metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl DataPoint {
    /// Create a new data point without a sample size
    pub fn new(source: impl Into<String>, source_type: SourceType, timestamp: u64) -> Self {
        Self {
            source: source.into(),
            source_type,
            sample_size: None,
            timestamp,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the sample size
    pub fn with_sample_size(mut self, sample_size: u64) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sample count used for lineage totals
    pub fn effective_count(&self) -> u64 {
        self.sample_size.unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_count_defaults_to_one() {
        let dp = DataPoint::new("survey:q1", SourceType::Survey, 1000);
        assert_eq!(dp.effective_count(), 1);
        assert_eq!(dp.with_sample_size(250).effective_count(), 250);
    }

    #[test]
    fn test_source_type_parse() {
        assert_eq!(SourceType::parse("Interview"), Some(SourceType::Interview));
        assert_eq!(SourceType::parse("focus-group"), None);
        assert!("transaction".parse::<SourceType>().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"source":"sim:run-1","sourceType":"simulation","sampleSize":40,"timestamp":5}"#;
        let dp: DataPoint = serde_json::from_str(json).unwrap();
        assert_eq!(dp.source_type, SourceType::Simulation);
        assert_eq!(dp.sample_size, Some(40));
        assert!(dp.metadata.is_empty());
    }
}
