//! Argumentation strength computation
//!
//! Implements the deterministic grading formula that turns evidence, a logic
//! chain and aggregated data sources into a strength label and a confidence
//! score. The calculator never fails: absent inputs score their baseline.

use crate::clock::{age_days, now_millis};
use crate::{
    Argumentation, DataPoint, DataSource, DataSourceKind, DateRange, Evidence, LogicChain,
    PartialArgumentation, SourceType, StrengthLabel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cap on the sample-size sub-score
pub const SAMPLE_SIZE_CAP: f64 = 40.0;

/// Responses per sample-size point
pub const SAMPLES_PER_POINT: f64 = 25.0;

/// Cap on the source-diversity sub-score
pub const DIVERSITY_CAP: f64 = 30.0;

/// Points per distinct source type
pub const POINTS_PER_SOURCE_TYPE: f64 = 10.0;

/// Bonus when at least two source types corroborate each other
pub const CROSS_VALIDATION_BONUS: f64 = 10.0;

/// Score at or above which the label is strong
pub const STRONG_THRESHOLD: f64 = 70.0;

/// Score at or above which the label is moderate
pub const MODERATE_THRESHOLD: f64 = 40.0;

/// Baseline logic quality
pub const LOGIC_BASELINE: f64 = 50.0;

/// Recency thresholds and points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentationConfig {
    /// Mean age (days) below which data counts as fresh
    pub fresh_days: f64,
    /// Points for fresh data
    pub fresh_points: f64,
    /// Mean age (days) below which data counts as recent
    pub recent_days: f64,
    /// Points for recent data
    pub recent_points: f64,
}

impl Default for ArgumentationConfig {
    fn default() -> Self {
        Self {
            fresh_days: 30.0,
            fresh_points: 20.0,
            recent_days: 90.0,
            recent_points: 10.0,
        }
    }
}

/// The four sub-scores behind a strength score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthBreakdown {
    /// `min(40, totalSampleSize / 25)`
    pub sample_size: f64,
    /// `min(30, uniqueSourceTypes * 10)`
    pub diversity: f64,
    /// 20, 10 or 0 depending on mean data age
    pub recency: f64,
    /// 10 when two or more source types are present
    pub cross_validation: f64,
}

impl StrengthBreakdown {
    /// Total strength score [0, 100]
    pub fn total(&self) -> f64 {
        self.sample_size + self.diversity + self.recency + self.cross_validation
    }

    /// Label for the total score
    pub fn label(&self) -> StrengthLabel {
        label_for(self.total())
    }
}

/// Map a strength score to its label
pub fn label_for(score: f64) -> StrengthLabel {
    if score >= STRONG_THRESHOLD {
        StrengthLabel::Strong
    } else if score >= MODERATE_THRESHOLD {
        StrengthLabel::Moderate
    } else {
        StrengthLabel::Weak
    }
}

/// Grades how well evidence supports a conclusion
#[derive(Debug, Clone, Default)]
pub struct ArgumentationCalculator {
    config: ArgumentationConfig,
}

impl ArgumentationCalculator {
    /// Create a calculator with default recency thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator with custom recency thresholds
    pub fn with_config(config: ArgumentationConfig) -> Self {
        Self { config }
    }

    /// Grade the input against the current wall clock
    pub fn calculate_strength(&self, partial: &PartialArgumentation) -> Argumentation {
        self.calculate_strength_at(partial, now_millis())
    }

    /// Grade the input with a fixed `now` (ms since epoch)
    pub fn calculate_strength_at(&self, partial: &PartialArgumentation, now: u64) -> Argumentation {
        let breakdown = self.breakdown_at(&partial.sources, now);
        let confidence = compute_confidence(
            breakdown.total(),
            evidence_quality(&partial.evidence),
            logic_quality(partial.logic.as_ref()),
        );

        Argumentation {
            strength: breakdown.label(),
            evidence: partial.evidence.clone(),
            logic: partial.logic.clone().unwrap_or_default(),
            confidence,
            sources: partial.sources.clone(),
        }
    }

    /// Compute the strength sub-scores for a set of sources
    pub fn breakdown_at(&self, sources: &[DataSource], now: u64) -> StrengthBreakdown {
        let total_samples = sources
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.response_count));
        let unique_types: HashSet<DataSourceKind> = sources.iter().map(|s| s.kind).collect();

        StrengthBreakdown {
            sample_size: (total_samples as f64 / SAMPLES_PER_POINT).min(SAMPLE_SIZE_CAP),
            diversity: (unique_types.len() as f64 * POINTS_PER_SOURCE_TYPE).min(DIVERSITY_CAP),
            recency: self.recency_score(sources, now),
            cross_validation: if unique_types.len() >= 2 {
                CROSS_VALIDATION_BONUS
            } else {
                0.0
            },
        }
    }

    fn recency_score(&self, sources: &[DataSource], now: u64) -> f64 {
        if sources.is_empty() {
            return 0.0;
        }

        let mean_age = sources
            .iter()
            .map(|s| age_days(s.date_range.start, now))
            .sum::<f64>()
            / sources.len() as f64;

        if mean_age < self.config.fresh_days {
            self.config.fresh_points
        } else if mean_age < self.config.recent_days {
            self.config.recent_points
        } else {
            0.0
        }
    }

    /// Aggregate leaf data points into data sources
    ///
    /// Points sharing a source id and type merge into one source whose response
    /// count is the sum of their sample sizes and whose date range spans them.
    pub fn derive_sources<'a, I>(data_points: I) -> Vec<DataSource>
    where
        I: IntoIterator<Item = &'a DataPoint>,
    {
        let mut sources: Vec<DataSource> = Vec::new();

        for dp in data_points {
            let kind = source_kind(dp.source_type);
            match sources.iter_mut().find(|s| s.id == dp.source && s.kind == kind) {
                Some(existing) => {
                    existing.response_count = existing.response_count.saturating_add(dp.effective_count());
                    existing.date_range.start = existing.date_range.start.min(dp.timestamp);
                    existing.date_range.end = existing.date_range.end.max(dp.timestamp);
                }
                None => sources.push(DataSource::new(
                    dp.source.clone(),
                    kind,
                    dp.effective_count(),
                    DateRange::new(dp.timestamp, dp.timestamp),
                )),
            }
        }

        sources
    }
}

/// `round(0.5*strength + 0.3*evidenceQuality + 0.2*logicQuality)`, clamped to [0, 100]
pub fn compute_confidence(strength_score: f64, evidence_quality: f64, logic_quality: f64) -> u8 {
    let raw = 0.5 * strength_score + 0.3 * evidence_quality + 0.2 * logic_quality;
    raw.round().clamp(0.0, 100.0) as u8
}

/// Mean over evidence items of `min(100, avgSupportingSampleSize / 10)`
pub fn evidence_quality(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }

    let total: f64 = evidence
        .iter()
        .map(|e| {
            if e.supporting_data.is_empty() {
                return 0.0;
            }
            let sum: f64 = e.supporting_data.iter().map(|d| d.sample_size.unwrap_or(0) as f64).sum();
            let avg = sum / e.supporting_data.len() as f64;
            (avg / 10.0).min(100.0)
        })
        .sum();

    total / evidence.len() as f64
}

/// 50 baseline, +20 premises, +20 reasoning, +10 conclusion, capped at 100
pub fn logic_quality(logic: Option<&LogicChain>) -> f64 {
    let Some(logic) = logic else {
        return LOGIC_BASELINE;
    };

    let mut score = LOGIC_BASELINE;
    if !logic.premise.is_empty() {
        score += 20.0;
    }
    if !logic.reasoning.trim().is_empty() {
        score += 20.0;
    }
    if !logic.conclusion.trim().is_empty() {
        score += 10.0;
    }
    score.min(100.0)
}

fn source_kind(source_type: SourceType) -> DataSourceKind {
    match source_type {
        SourceType::Survey => DataSourceKind::Question,
        SourceType::Interview => DataSourceKind::Interview,
        SourceType::Simulation => DataSourceKind::Simulation,
        SourceType::Transaction => DataSourceKind::Transaction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MILLIS_PER_DAY;
    use crate::{SupportingData, SupportingDataKind};

    const NOW: u64 = 400 * MILLIS_PER_DAY;

    fn source(kind: DataSourceKind, count: u64, age_days: u64) -> DataSource {
        let start = NOW - age_days * MILLIS_PER_DAY;
        DataSource::new(format!("{:?}-{}", kind, count), kind, count, DateRange::new(start, NOW))
    }

    fn evidence_with_samples(samples: &[Option<u64>]) -> Evidence {
        Evidence {
            claim: "Persona prefers the premium tier".to_string(),
            supporting_data: samples
                .iter()
                .map(|s| SupportingData {
                    kind: SupportingDataKind::Statistic,
                    value: serde_json::json!(0.62),
                    source: "survey:q4".to_string(),
                    sample_size: *s,
                })
                .collect(),
            strength: 70,
        }
    }

    #[test]
    fn test_sample_size_component() {
        let calc = ArgumentationCalculator::new();
        let b = calc.breakdown_at(&[source(DataSourceKind::Question, 1000, 200)], NOW);
        assert_eq!(b.sample_size, 40.0);

        let b = calc.breakdown_at(&[source(DataSourceKind::Question, 250, 200)], NOW);
        assert_eq!(b.sample_size, 10.0);
    }

    #[test]
    fn test_diversity_saturates() {
        let calc = ArgumentationCalculator::new();
        let sources = vec![
            source(DataSourceKind::Question, 1, 200),
            source(DataSourceKind::Interview, 1, 200),
            source(DataSourceKind::Simulation, 1, 200),
            source(DataSourceKind::Transaction, 1, 200),
        ];
        let b = calc.breakdown_at(&sources, NOW);
        assert_eq!(b.diversity, 30.0);
        assert_eq!(b.cross_validation, 10.0);
    }

    #[test]
    fn test_recency_bands() {
        let calc = ArgumentationCalculator::new();
        assert_eq!(calc.breakdown_at(&[source(DataSourceKind::Question, 1, 10)], NOW).recency, 20.0);
        assert_eq!(calc.breakdown_at(&[source(DataSourceKind::Question, 1, 60)], NOW).recency, 10.0);
        assert_eq!(calc.breakdown_at(&[source(DataSourceKind::Question, 1, 120)], NOW).recency, 0.0);
        assert_eq!(calc.breakdown_at(&[], NOW).recency, 0.0);
    }

    #[test]
    fn test_recency_uses_mean_age() {
        let calc = ArgumentationCalculator::new();
        // Mean of 10 and 100 days is 55 days
        let sources = vec![
            source(DataSourceKind::Question, 1, 10),
            source(DataSourceKind::Question, 1, 100),
        ];
        assert_eq!(calc.breakdown_at(&sources, NOW).recency, 10.0);
    }

    #[test]
    fn test_single_type_has_no_cross_validation() {
        let calc = ArgumentationCalculator::new();
        let sources = vec![
            source(DataSourceKind::Interview, 10, 5),
            source(DataSourceKind::Interview, 10, 5),
        ];
        let b = calc.breakdown_at(&sources, NOW);
        assert_eq!(b.diversity, 10.0);
        assert_eq!(b.cross_validation, 0.0);
    }

    #[test]
    fn test_survey_and_interview_scenario_is_strong() {
        let calc = ArgumentationCalculator::new();
        let partial = PartialArgumentation {
            sources: vec![
                source(DataSourceKind::Question, 600, 10),
                source(DataSourceKind::Interview, 600, 10),
            ],
            ..Default::default()
        };

        let b = calc.breakdown_at(&partial.sources, NOW);
        assert_eq!(b.diversity, 20.0);
        assert_eq!(b.recency, 20.0);
        assert_eq!(b.cross_validation, 10.0);
        assert_eq!(b.sample_size, 40.0);
        assert_eq!(b.total(), 90.0);

        let arg = calc.calculate_strength_at(&partial, NOW);
        assert_eq!(arg.strength, StrengthLabel::Strong);
        // 0.5*90 + 0.3*0 + 0.2*50 = 55
        assert_eq!(arg.confidence, 55);
    }

    #[test]
    fn test_labels() {
        assert_eq!(label_for(70.0), StrengthLabel::Strong);
        assert_eq!(label_for(69.9), StrengthLabel::Moderate);
        assert_eq!(label_for(40.0), StrengthLabel::Moderate);
        assert_eq!(label_for(39.9), StrengthLabel::Weak);
    }

    #[test]
    fn test_evidence_quality() {
        assert_eq!(evidence_quality(&[]), 0.0);
        // avg 200 / 10 = 20
        assert_eq!(evidence_quality(&[evidence_with_samples(&[Some(100), Some(300)])]), 20.0);
        // missing sample size counts as 0: avg 50 / 10 = 5
        assert_eq!(evidence_quality(&[evidence_with_samples(&[Some(100), None])]), 5.0);
        // capped at 100, averaged with an item lacking supporting data
        let items = vec![evidence_with_samples(&[Some(5000)]), evidence_with_samples(&[])];
        assert_eq!(evidence_quality(&items), 50.0);
    }

    #[test]
    fn test_logic_quality() {
        assert_eq!(logic_quality(None), 50.0);
        assert_eq!(logic_quality(Some(&LogicChain::default())), 50.0);

        let full = LogicChain {
            premise: vec!["Price is the top objection".to_string()],
            reasoning: "Lower price removes the objection".to_string(),
            conclusion: "Discount increases intent".to_string(),
            alternative_explanations: None,
        };
        assert_eq!(logic_quality(Some(&full)), 100.0);

        let partial = LogicChain {
            premise: vec!["p".to_string()],
            ..Default::default()
        };
        assert_eq!(logic_quality(Some(&partial)), 70.0);
    }

    #[test]
    fn test_confidence_formula() {
        // 0.5*90 + 0.3*20 + 0.2*100 = 71
        assert_eq!(compute_confidence(90.0, 20.0, 100.0), 71);
        // 0.5*45 + 0.3*5 + 0.2*50 = 34
        assert_eq!(compute_confidence(45.0, 5.0, 50.0), 34);
    }

    #[test]
    fn test_empty_input_defaults() {
        let arg = ArgumentationCalculator::new().calculate_strength_at(&PartialArgumentation::default(), NOW);
        assert_eq!(arg.strength, StrengthLabel::Weak);
        // Only the logic baseline contributes: 0.2 * 50 = 10
        assert_eq!(arg.confidence, 10);
        assert_eq!(arg.logic, LogicChain::default());
    }

    #[test]
    fn test_derive_sources_merges_points() {
        let points = vec![
            DataPoint::new("survey:q1", SourceType::Survey, 100).with_sample_size(50),
            DataPoint::new("survey:q1", SourceType::Survey, 300).with_sample_size(25),
            DataPoint::new("persona:p1", SourceType::Simulation, 200),
        ];
        let sources = ArgumentationCalculator::derive_sources(&points);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, DataSourceKind::Question);
        assert_eq!(sources[0].response_count, 75);
        assert_eq!(sources[0].date_range, DateRange::new(100, 300));
        assert_eq!(sources[1].response_count, 1);
    }

    #[test]
    fn test_huge_response_counts_saturate() {
        let calc = ArgumentationCalculator::new();
        let half = u64::MAX / 2 + 1;
        let partial = PartialArgumentation {
            sources: vec![
                source(DataSourceKind::Question, half, 10),
                source(DataSourceKind::Interview, half, 10),
            ],
            evidence: vec![evidence_with_samples(&[Some(u64::MAX), Some(u64::MAX)])],
            ..Default::default()
        };

        let b = calc.breakdown_at(&partial.sources, NOW);
        assert_eq!(b.sample_size, 40.0);
        assert_eq!(b.total(), 90.0);
        assert_eq!(evidence_quality(&partial.evidence), 100.0);

        let arg = calc.calculate_strength_at(&partial, NOW);
        assert_eq!(arg.strength, StrengthLabel::Strong);
        // 0.5*90 + 0.3*100 + 0.2*50 = 85
        assert_eq!(arg.confidence, 85);

        let points = vec![
            DataPoint::new("survey:q1", SourceType::Survey, 100).with_sample_size(half),
            DataPoint::new("survey:q1", SourceType::Survey, 200).with_sample_size(half),
        ];
        let merged = ArgumentationCalculator::derive_sources(&points);
        assert_eq!(merged[0].response_count, u64::MAX);
    }
}
