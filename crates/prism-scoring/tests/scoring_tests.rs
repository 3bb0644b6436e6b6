//! Integration tests for host-supplied rule sets
//!
//! Rules and persona contexts arrive as JSON; these tests run them through the
//! public API the way the pipeline does.

use prism_scoring::{ModeKind, RuleSet, ScoringContext, ScoringEngine, ScoringMode, ValidationError};

const RULES: &str = r#"[
    {"metric": "purchase_intent", "expression": {"kind": "linear", "terms": [
        {"signal": "quality_rating", "weight": 0.4},
        {"signal": "brand_trust", "weight": 0.3},
        {"signal": "income_band", "weight": 0.3, "categories": {"low": 0.2, "mid": 0.5, "high": 0.8}}
    ]}},
    {"metric": "price_objection", "expression": {"kind": "conditional",
        "branches": [
            {"when": {"signal": "price_sensitivity", "op": "gte", "threshold": 0.7},
             "terms": [{"signal": "price_sensitivity", "weight": 1.0}]}
        ],
        "otherwise": [
            {"signal": "price_sensitivity", "weight": 0.5},
            {"signal": "brand_trust", "weight": 0.5}
        ]}}
]"#;

fn personas() -> Vec<ScoringContext> {
    serde_json::from_str(
        r#"[
        {"quality_rating": 0.9, "brand_trust": 0.6, "income_band": "high", "price_sensitivity": 0.8},
        {"quality_rating": 0.5, "brand_trust": 0.2, "income_band": "low", "price_sensitivity": 0.4}
    ]"#,
    )
    .unwrap()
}

#[test]
fn test_json_rules_score_each_persona() {
    let engine = ScoringEngine::default_config();
    let rules: RuleSet = serde_json::from_str(RULES).unwrap();
    let personas = personas();

    let first = engine.evaluate(&personas[0], &rules).unwrap();
    // 0.4*0.9 + 0.3*0.6 + 0.3*0.8 = 0.78
    assert!((first.value("purchase_intent").unwrap() - 0.78).abs() < 1e-9);
    assert_eq!(first.get("price_objection").unwrap().branch, Some(0));

    let second = engine.evaluate(&personas[1], &rules).unwrap();
    // 0.5*0.4 + 0.5*0.2 = 0.3 via the fallback terms
    assert!((second.value("price_objection").unwrap() - 0.3).abs() < 1e-9);
    assert_eq!(second.get("price_objection").unwrap().branch, None);

    // Output follows rule order
    let names: Vec<_> = first.metrics.iter().map(|m| m.metric.as_str()).collect();
    assert_eq!(names, vec!["purchase_intent", "price_objection"]);
}

#[test]
fn test_batch_hybrid_from_json_mode() {
    let engine = ScoringEngine::default_config();
    let rules: RuleSet = serde_json::from_str(RULES).unwrap();
    let mode: ScoringMode = serde_json::from_str(
        r#"{"mode": "hybrid", "model_scores": {"purchase_intent": 0.5, "price_objection": 0.5}, "mix_ratio": 1.0}"#,
    )
    .unwrap();

    let batch = engine.evaluate_batch(&personas(), &rules, &mode).unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch.results.iter().all(|r| r.mode == ModeKind::Hybrid));

    // A ratio of 1.0 keeps the rule score untouched
    let rule_only = engine.evaluate_batch(&personas(), &rules, &ScoringMode::Rule).unwrap();
    let hybrid_mean = batch.mean("purchase_intent").unwrap();
    let rule_mean = rule_only.mean("purchase_intent").unwrap();
    assert!((hybrid_mean - rule_mean).abs() < 1e-9);
}

#[test]
fn test_missing_signal_fails_whole_batch() {
    let engine = ScoringEngine::default_config();
    let rules: RuleSet = serde_json::from_str(RULES).unwrap();
    let mut personas = personas();
    personas.push(serde_json::from_str(r#"{"quality_rating": 0.7}"#).unwrap());

    let err = engine.evaluate_batch(&personas, &rules, &ScoringMode::Rule).unwrap_err();
    assert!(matches!(err, ValidationError::MissingSignal { .. }));
    assert!(err.to_string().contains("brand_trust"));
}

#[test]
fn test_scored_result_serializes_camel_case() {
    let engine = ScoringEngine::default_config();
    let rules: RuleSet = serde_json::from_str(RULES).unwrap();
    let result = engine.evaluate(&personas()[0], &rules).unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["mode"], "rule");
    assert!(value["metrics"][0]["ruleScore"].is_number());
    assert!(value["metrics"][0].get("modelScore").is_none());
}
