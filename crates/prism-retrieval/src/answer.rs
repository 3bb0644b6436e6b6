//! Answer synthesis from retrieved documents

use crate::index::Hit;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Follow-up suggestions attached to every successful query
pub const RELATED_QUESTIONS: [&str; 3] = [
    "Which segments respond most strongly to this concept?",
    "How do survey and interview findings differ?",
    "What evidence would strengthen the weakest conclusion?",
];

/// A retrieved document as cited in an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedSource {
    /// Document id
    pub id: String,
    /// Document type
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Id of the host object behind the document
    pub source_id: String,
    /// Cosine similarity to the question
    pub similarity: f32,
    /// Responses represented by the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Leading part of the document text
    pub snippet: String,
    /// Host metadata carried through from the record
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// Answer to a free-text question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagResult {
    /// Synthesized answer text
    pub answer: String,
    /// Retrieved documents, best first
    pub sources: Vec<RetrievedSource>,
    /// `round(mean similarity * 100)`; 0 with no sources
    pub confidence: u8,
    /// Suggested follow-up questions (never empty)
    pub related_questions: Vec<String>,
    /// How the answer was produced
    pub reasoning: String,
}

/// Build a result from ranked hits
pub(crate) fn synthesize(question: &str, hits: &[Hit<'_>], searched: usize, snippet_chars: usize) -> RagResult {
    let sources: Vec<RetrievedSource> = hits
        .iter()
        .map(|hit| {
            let doc = hit.document;
            RetrievedSource {
                id: doc.id.clone(),
                doc_type: doc.metadata.doc_type.clone(),
                source_id: doc.metadata.source_id.clone(),
                similarity: hit.similarity,
                sample_size: doc.metadata.sample_size,
                timestamp: doc.metadata.timestamp,
                snippet: doc.text.chars().take(snippet_chars).collect(),
                metadata: doc.metadata.extra.clone(),
            }
        })
        .collect();

    RagResult {
        answer: compose_answer(question, &sources),
        confidence: confidence(&sources),
        related_questions: RELATED_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        reasoning: format!(
            "Ranked {} indexed documents by cosine similarity to the question and kept the top {}.",
            searched,
            sources.len()
        ),
        sources,
    }
}

fn confidence(sources: &[RetrievedSource]) -> u8 {
    if sources.is_empty() {
        return 0;
    }
    let mean = sources.iter().map(|s| s.similarity as f64).sum::<f64>() / sources.len() as f64;
    (mean * 100.0).round().clamp(0.0, 100.0) as u8
}

fn compose_answer(question: &str, sources: &[RetrievedSource]) -> String {
    if sources.is_empty() {
        return format!("No indexed content matched \"{}\".", question);
    }

    let total_samples = sources
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.sample_size.unwrap_or(0)));
    let source_types: BTreeSet<&str> = sources.iter().map(|s| s.doc_type.as_str()).collect();

    let mut answer = format!(
        "Based on {} relevant documents covering {} responses from {} source type{}:",
        sources.len(),
        total_samples,
        source_types.len(),
        if source_types.len() == 1 { "" } else { "s" }
    );
    for source in sources {
        // Writing to a String cannot fail
        let _ = write!(
            answer,
            "\n- [{}] {} (similarity {:.2})",
            source.doc_type, source.id, source.similarity
        );
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DocumentMetadata, VectorDocument};

    fn doc(id: &str, doc_type: &str, sample_size: Option<u64>) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            text: "a fairly long response about the price point".to_string(),
            embedding: vec![],
            metadata: DocumentMetadata {
                doc_type: doc_type.to_string(),
                source_id: id.to_string(),
                timestamp: 0,
                sample_size,
                extra: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_summary_counts_samples_and_types() {
        let docs = vec![doc("r1", "survey", Some(120)), doc("r2", "interview", Some(30)), doc("r3", "survey", None)];
        let hits: Vec<Hit<'_>> = docs
            .iter()
            .zip([0.9f32, 0.6, 0.3])
            .map(|(document, similarity)| Hit { document, similarity })
            .collect();

        let result = synthesize("price?", &hits, 10, 8);
        assert!(result.answer.starts_with("Based on 3 relevant documents covering 150 responses from 2 source types:"));
        assert!(result.answer.contains("- [interview] r2 (similarity 0.60)"));
        assert_eq!(result.confidence, 60);
        assert_eq!(result.sources[0].snippet, "a fairly");
        assert_eq!(result.related_questions.len(), 3);
        assert!(result.reasoning.contains("Ranked 10 indexed documents"));
    }

    #[test]
    fn test_sample_total_saturates() {
        let docs = vec![doc("r1", "survey", Some(u64::MAX)), doc("r2", "survey", Some(u64::MAX))];
        let hits: Vec<Hit<'_>> = docs.iter().map(|document| Hit { document, similarity: 0.5 }).collect();

        let result = synthesize("price?", &hits, 2, 8);
        assert!(result.answer.contains(&format!("covering {} responses", u64::MAX)));
    }

    #[test]
    fn test_empty_hits() {
        let result = synthesize("anything", &[], 0, 160);
        assert_eq!(result.confidence, 0);
        assert!(result.sources.is_empty());
        assert!(!result.related_questions.is_empty());
        assert!(result.answer.contains("No indexed content"));
    }
}
