//! Rule and hybrid evaluation

use crate::rule::{Comparison, Condition, Expression, Rule, RuleSet, ScoringContext, ScoringMode, Signal, WeightedTerm};
use crate::{ScoringConfig, ScoringResult, ValidationError};
use serde::Serialize;
use std::collections::HashSet;

/// Floating-point slack added to the weight tolerance
const SUM_EPSILON: f64 = 1e-9;

/// Which evaluation mode produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    /// Rule score only
    Rule,
    /// Rule score blended with a model score
    Hybrid,
}

/// One signal's share of a metric score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    /// Signal name
    pub signal: String,
    /// Weight applied
    pub weight: f64,
    /// Numeric value of the signal
    pub value: f64,
    /// `weight * value`
    pub contribution: f64,
}

/// The evaluated value of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    /// Metric name
    pub metric: String,
    /// Final value (blended in hybrid mode)
    pub value: f64,
    /// Deterministic rule score
    pub rule_score: f64,
    /// Model score used in hybrid mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_score: Option<f64>,
    /// Index of the conditional branch taken (None for linear rules or fallback)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<usize>,
    /// Per-signal breakdown of the rule score
    pub contributions: Vec<Contribution>,
}

/// Output of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    /// Mode used
    pub mode: ModeKind,
    /// Metric scores in rule order
    pub metrics: Vec<MetricScore>,
}

impl ScoredResult {
    /// Look up a metric score by name
    pub fn get(&self, metric: &str) -> Option<&MetricScore> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    /// Look up a metric value by name
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.get(metric).map(|m| m.value)
    }
}

/// Results for a batch of persona contexts
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScoredBatch {
    /// One result per context, in input order
    pub results: Vec<ScoredResult>,
}

impl ScoredBatch {
    /// Mean value of a metric across the batch
    pub fn mean(&self, metric: &str) -> Option<f64> {
        let values: Vec<f64> = self.results.iter().filter_map(|r| r.value(metric)).collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Number of evaluated contexts
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Turns persona context into metric values
///
/// Evaluation is deterministic: identical context and rules always yield
/// identical output.
///
/// # Examples
///
/// ```
/// use prism_scoring::{Rule, RuleSet, ScoringContext, ScoringEngine, WeightedTerm};
///
/// let engine = ScoringEngine::default_config();
/// let context = ScoringContext::new().with("quality", 0.8).with("trust", 0.5);
/// let rules = RuleSet::new(vec![Rule::linear(
///     "intent",
///     vec![WeightedTerm::new("quality", 0.5), WeightedTerm::new("trust", 0.5)],
/// )]);
///
/// let result = engine.evaluate(&context, &rules).unwrap();
/// assert!((result.value("intent").unwrap() - 0.65).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: ScoringConfig) -> ScoringResult<Self> {
        config.validate().map_err(ValidationError::Config)?;
        Ok(Self { config })
    }

    /// Create an engine with default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Get the configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate rules in rule-only mode
    pub fn evaluate(&self, context: &ScoringContext, rules: &RuleSet) -> ScoringResult<ScoredResult> {
        self.evaluate_with_mode(context, rules, &ScoringMode::Rule)
    }

    /// Evaluate rules in the given mode
    ///
    /// # Errors
    /// Returns a [`ValidationError`] when weights are malformed, a referenced
    /// signal is missing, or the hybrid inputs are incomplete.
    pub fn evaluate_with_mode(
        &self,
        context: &ScoringContext,
        rules: &RuleSet,
        mode: &ScoringMode,
    ) -> ScoringResult<ScoredResult> {
        self.validate_rules(rules)?;
        let mix_ratio = self.resolve_mix_ratio(mode)?;

        let mut metrics = Vec::with_capacity(rules.len());
        for rule in rules.iter() {
            let mut score = self.evaluate_rule(context, rule)?;

            if let ScoringMode::Hybrid { model_scores, .. } = mode {
                let model = *model_scores
                    .get(&rule.metric)
                    .ok_or_else(|| ValidationError::MissingModelScore(rule.metric.clone()))?;
                let ratio = mix_ratio.unwrap_or(self.config.default_mix_ratio);
                score.value = ratio * score.rule_score + (1.0 - ratio) * model;
                score.model_score = Some(model);
            }

            tracing::debug!("Scored metric '{}' = {}", score.metric, score.value);
            metrics.push(score);
        }

        let kind = match mode {
            ScoringMode::Rule => ModeKind::Rule,
            ScoringMode::Hybrid { .. } => ModeKind::Hybrid,
        };
        Ok(ScoredResult { mode: kind, metrics })
    }

    /// Evaluate the same rules against many persona contexts
    pub fn evaluate_batch(
        &self,
        contexts: &[ScoringContext],
        rules: &RuleSet,
        mode: &ScoringMode,
    ) -> ScoringResult<ScoredBatch> {
        let results = contexts
            .iter()
            .map(|ctx| self.evaluate_with_mode(ctx, rules, mode))
            .collect::<ScoringResult<Vec<_>>>()?;

        tracing::info!("Scored {} contexts against {} rules", results.len(), rules.len());
        Ok(ScoredBatch { results })
    }

    /// Check rule structure independently of any context
    ///
    /// Every term list (including untaken branches) must be non-empty and its
    /// weights must sum to 1.0 within the configured tolerance.
    pub fn validate_rules(&self, rules: &RuleSet) -> ScoringResult<()> {
        let mut seen = HashSet::new();

        for rule in rules.iter() {
            if !seen.insert(rule.metric.as_str()) {
                return Err(ValidationError::DuplicateMetric(rule.metric.clone()));
            }

            for (set, terms) in rule.expression.term_sets() {
                if terms.is_empty() {
                    return Err(ValidationError::EmptyTerms {
                        metric: rule.metric.clone(),
                        set,
                    });
                }

                let sum: f64 = terms.iter().map(|t| t.weight).sum();
                // NaN sums fail this comparison too
                if !((sum - 1.0).abs() <= self.config.weight_tolerance + SUM_EPSILON) {
                    return Err(ValidationError::WeightSum {
                        metric: rule.metric.clone(),
                        set,
                        sum,
                        tolerance: self.config.weight_tolerance,
                    });
                }
            }
        }

        Ok(())
    }

    fn resolve_mix_ratio(&self, mode: &ScoringMode) -> ScoringResult<Option<f64>> {
        match mode {
            ScoringMode::Rule => Ok(None),
            ScoringMode::Hybrid { mix_ratio, .. } => {
                let ratio = mix_ratio.unwrap_or(self.config.default_mix_ratio);
                if !(0.0..=1.0).contains(&ratio) {
                    return Err(ValidationError::MixRatioOutOfRange(ratio));
                }
                Ok(Some(ratio))
            }
        }
    }

    fn evaluate_rule(&self, context: &ScoringContext, rule: &Rule) -> ScoringResult<MetricScore> {
        let (terms, branch) = match &rule.expression {
            Expression::Linear { terms } => (terms.as_slice(), None),
            Expression::Conditional { branches, otherwise } => {
                let mut chosen = None;
                for (i, b) in branches.iter().enumerate() {
                    if condition_holds(&rule.metric, context, &b.when)? {
                        chosen = Some((b.terms.as_slice(), Some(i)));
                        break;
                    }
                }
                chosen.unwrap_or((otherwise.as_slice(), None))
            }
        };

        let contributions = terms
            .iter()
            .map(|term| {
                let value = term_value(&rule.metric, context, term)?;
                Ok(Contribution {
                    signal: term.signal.clone(),
                    weight: term.weight,
                    value,
                    contribution: term.weight * value,
                })
            })
            .collect::<ScoringResult<Vec<_>>>()?;

        let rule_score = contributions.iter().map(|c| c.contribution).sum();

        Ok(MetricScore {
            metric: rule.metric.clone(),
            value: rule_score,
            rule_score,
            model_score: None,
            branch,
            contributions,
        })
    }
}

fn lookup<'a>(metric: &str, context: &'a ScoringContext, signal: &str) -> ScoringResult<&'a Signal> {
    context.get(signal).ok_or_else(|| ValidationError::MissingSignal {
        metric: metric.to_string(),
        signal: signal.to_string(),
    })
}

fn term_value(metric: &str, context: &ScoringContext, term: &WeightedTerm) -> ScoringResult<f64> {
    match lookup(metric, context, &term.signal)? {
        Signal::Numeric(v) => Ok(*v),
        Signal::Categorical(category) => {
            term.categories
                .get(category)
                .copied()
                .ok_or_else(|| ValidationError::UnmappedCategory {
                    metric: metric.to_string(),
                    signal: term.signal.clone(),
                    category: category.clone(),
                })
        }
    }
}

fn condition_holds(metric: &str, context: &ScoringContext, condition: &Condition) -> ScoringResult<bool> {
    let invalid = |reason: &str| ValidationError::InvalidComparison {
        metric: metric.to_string(),
        signal: condition.signal.clone(),
        reason: reason.to_string(),
    };

    match (lookup(metric, context, &condition.signal)?, &condition.threshold) {
        (Signal::Numeric(v), Signal::Numeric(t)) => Ok(match condition.op {
            Comparison::Gt => v > t,
            Comparison::Gte => v >= t,
            Comparison::Lt => v < t,
            Comparison::Lte => v <= t,
            Comparison::Eq => (v - t).abs() < f64::EPSILON,
            Comparison::Ne => (v - t).abs() >= f64::EPSILON,
        }),
        (Signal::Categorical(v), Signal::Categorical(t)) => match condition.op {
            Comparison::Eq => Ok(v == t),
            Comparison::Ne => Ok(v != t),
            _ => Err(invalid("categorical signals support only eq and ne")),
        },
        _ => Err(invalid("signal and threshold have different types")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Branch;
    use std::collections::BTreeMap;

    fn persona() -> ScoringContext {
        ScoringContext::new()
            .with("price_sensitivity", 0.8)
            .with("quality_rating", 0.9)
            .with("brand_trust", 0.4)
            .with("income_band", "high")
    }

    fn intent_rule() -> Rule {
        Rule::linear(
            "purchase_intent",
            vec![
                WeightedTerm::new("quality_rating", 0.5),
                WeightedTerm::new("brand_trust", 0.3),
                WeightedTerm::new("price_sensitivity", 0.2),
            ],
        )
    }

    #[test]
    fn test_linear_weighted_sum() {
        let engine = ScoringEngine::default_config();
        let result = engine.evaluate(&persona(), &RuleSet::new(vec![intent_rule()])).unwrap();

        let score = result.get("purchase_intent").unwrap();
        // 0.5*0.9 + 0.3*0.4 + 0.2*0.8 = 0.73
        assert!((score.value - 0.73).abs() < 1e-9);
        assert_eq!(score.contributions.len(), 3);
        assert_eq!(result.mode, ModeKind::Rule);
    }

    #[test]
    fn test_weights_outside_tolerance() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![Rule::linear(
            "bad",
            vec![WeightedTerm::new("quality_rating", 0.5), WeightedTerm::new("brand_trust", 0.48)],
        )]);

        let err = engine.evaluate(&persona(), &rules).unwrap_err();
        assert!(matches!(err, ValidationError::WeightSum { .. }));
    }

    #[test]
    fn test_weights_within_tolerance() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![Rule::linear(
            "ok",
            vec![WeightedTerm::new("quality_rating", 0.5), WeightedTerm::new("brand_trust", 0.505)],
        )]);
        assert!(engine.evaluate(&persona(), &rules).is_ok());
    }

    #[test]
    fn test_missing_signal() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![Rule::linear("x", vec![WeightedTerm::new("loyalty", 1.0)])]);

        let err = engine.evaluate(&persona(), &rules).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingSignal {
                metric: "x".to_string(),
                signal: "loyalty".to_string()
            }
        );
    }

    #[test]
    fn test_categorical_term() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![Rule::linear(
            "affordability",
            vec![WeightedTerm::new("income_band", 1.0)
                .with_category("high", 0.9)
                .with_category("low", 0.2)],
        )]);

        let result = engine.evaluate(&persona(), &rules).unwrap();
        assert_eq!(result.value("affordability"), Some(0.9));

        let rules = RuleSet::new(vec![Rule::linear(
            "affordability",
            vec![WeightedTerm::new("income_band", 1.0).with_category("low", 0.2)],
        )]);
        assert!(matches!(
            engine.evaluate(&persona(), &rules),
            Err(ValidationError::UnmappedCategory { .. })
        ));
    }

    #[test]
    fn test_conditional_branch_selection() {
        let engine = ScoringEngine::default_config();
        let rule = Rule::conditional(
            "churn_risk",
            vec![
                Branch {
                    when: Condition::new("price_sensitivity", Comparison::Gt, 0.9),
                    terms: vec![WeightedTerm::new("price_sensitivity", 1.0)],
                },
                Branch {
                    when: Condition::new("income_band", Comparison::Eq, "high"),
                    terms: vec![WeightedTerm::new("brand_trust", 1.0)],
                },
            ],
            vec![WeightedTerm::new("quality_rating", 1.0)],
        );

        let result = engine.evaluate(&persona(), &RuleSet::new(vec![rule.clone()])).unwrap();
        let score = result.get("churn_risk").unwrap();
        assert_eq!(score.branch, Some(1));
        assert_eq!(score.value, 0.4);

        let other = persona().with("income_band", "low");
        let result = engine.evaluate(&other, &RuleSet::new(vec![rule])).unwrap();
        assert_eq!(result.get("churn_risk").unwrap().branch, None);
        assert_eq!(result.value("churn_risk"), Some(0.9));
    }

    #[test]
    fn test_untaken_branch_weights_still_validated() {
        let engine = ScoringEngine::default_config();
        let rule = Rule::conditional(
            "m",
            vec![Branch {
                when: Condition::new("price_sensitivity", Comparison::Gt, 5.0),
                terms: vec![WeightedTerm::new("price_sensitivity", 0.3)],
            }],
            vec![WeightedTerm::new("quality_rating", 1.0)],
        );
        assert!(matches!(
            engine.evaluate(&persona(), &RuleSet::new(vec![rule])),
            Err(ValidationError::WeightSum { .. })
        ));
    }

    #[test]
    fn test_categorical_ordering_rejected() {
        let engine = ScoringEngine::default_config();
        let rule = Rule::conditional(
            "m",
            vec![Branch {
                when: Condition::new("income_band", Comparison::Gt, "low"),
                terms: vec![WeightedTerm::new("brand_trust", 1.0)],
            }],
            vec![WeightedTerm::new("quality_rating", 1.0)],
        );
        assert!(matches!(
            engine.evaluate(&persona(), &RuleSet::new(vec![rule])),
            Err(ValidationError::InvalidComparison { .. })
        ));
    }

    #[test]
    fn test_duplicate_metric_and_empty_terms() {
        let engine = ScoringEngine::default_config();
        let dup = RuleSet::new(vec![intent_rule(), intent_rule()]);
        assert_eq!(
            engine.validate_rules(&dup),
            Err(ValidationError::DuplicateMetric("purchase_intent".to_string()))
        );

        let empty = RuleSet::new(vec![Rule::linear("empty", vec![])]);
        assert!(matches!(engine.validate_rules(&empty), Err(ValidationError::EmptyTerms { .. })));
    }

    #[test]
    fn test_hybrid_blend() {
        let engine = ScoringEngine::default_config();
        let mut model_scores = BTreeMap::new();
        model_scores.insert("purchase_intent".to_string(), 0.33);
        let mode = ScoringMode::Hybrid {
            model_scores,
            mix_ratio: Some(0.75),
        };

        let result = engine
            .evaluate_with_mode(&persona(), &RuleSet::new(vec![intent_rule()]), &mode)
            .unwrap();
        let score = result.get("purchase_intent").unwrap();
        // 0.75*0.73 + 0.25*0.33 = 0.63
        assert!((score.value - 0.63).abs() < 1e-9);
        assert!((score.rule_score - 0.73).abs() < 1e-9);
        assert_eq!(score.model_score, Some(0.33));
        assert_eq!(result.mode, ModeKind::Hybrid);
    }

    #[test]
    fn test_hybrid_default_ratio_and_errors() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![intent_rule()]);

        let mut model_scores = BTreeMap::new();
        model_scores.insert("purchase_intent".to_string(), 0.27);
        let mode = ScoringMode::Hybrid {
            model_scores: model_scores.clone(),
            mix_ratio: None,
        };
        let result = engine.evaluate_with_mode(&persona(), &rules, &mode).unwrap();
        // 0.5*0.73 + 0.5*0.27 = 0.5
        assert!((result.value("purchase_intent").unwrap() - 0.5).abs() < 1e-9);

        let bad_ratio = ScoringMode::Hybrid {
            model_scores,
            mix_ratio: Some(1.2),
        };
        assert_eq!(
            engine.evaluate_with_mode(&persona(), &rules, &bad_ratio),
            Err(ValidationError::MixRatioOutOfRange(1.2))
        );

        let missing = ScoringMode::Hybrid {
            model_scores: BTreeMap::new(),
            mix_ratio: Some(0.5),
        };
        assert_eq!(
            engine.evaluate_with_mode(&persona(), &rules, &missing),
            Err(ValidationError::MissingModelScore("purchase_intent".to_string()))
        );
    }

    #[test]
    fn test_deterministic() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![intent_rule()]);
        let a = engine.evaluate(&persona(), &rules).unwrap();
        let b = engine.evaluate(&persona(), &rules).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_mean() {
        let engine = ScoringEngine::default_config();
        let rules = RuleSet::new(vec![Rule::linear("q", vec![WeightedTerm::new("quality_rating", 1.0)])]);
        let contexts = vec![
            ScoringContext::new().with("quality_rating", 0.2),
            ScoringContext::new().with("quality_rating", 0.6),
        ];

        let batch = engine.evaluate_batch(&contexts, &rules, &ScoringMode::Rule).unwrap();
        assert_eq!(batch.len(), 2);
        assert!((batch.mean("q").unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(batch.mean("unknown"), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScoringConfig {
            weight_tolerance: -0.1,
            ..Default::default()
        };
        assert!(matches!(ScoringEngine::new(config), Err(ValidationError::Config(_))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn two_term_rules(w1: f64, w2: f64) -> RuleSet {
        RuleSet::new(vec![Rule::linear(
            "m",
            vec![WeightedTerm::new("a", w1), WeightedTerm::new("b", w2)],
        )])
    }

    fn context() -> ScoringContext {
        ScoringContext::new().with("a", 0.3).with("b", 0.7)
    }

    proptest! {
        /// Property: Weight sets summing to 1.0 ± 0.01 always evaluate
        #[test]
        fn test_weights_in_tolerance_succeed(w1 in 0.0f64..1.0, delta in -0.0099f64..0.0099) {
            let engine = ScoringEngine::default_config();
            let rules = two_term_rules(w1, 1.0 - w1 + delta);
            prop_assert!(engine.evaluate(&context(), &rules).is_ok());
        }

        /// Property: Weight sets outside the tolerance always fail validation
        #[test]
        fn test_weights_out_of_tolerance_fail(w1 in 0.0f64..1.0, delta in 0.0101f64..2.0, negative in any::<bool>()) {
            let engine = ScoringEngine::default_config();
            let delta = if negative { -delta } else { delta };
            let rules = two_term_rules(w1, 1.0 - w1 + delta);
            let is_weight_sum_error = matches!(
                engine.evaluate(&context(), &rules),
                Err(ValidationError::WeightSum { .. })
            );
            prop_assert!(is_weight_sum_error);
        }
    }
}
