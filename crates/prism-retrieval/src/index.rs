//! Immutable vector index snapshots
//!
//! A snapshot is built in full and never mutated afterwards. Re-indexing
//! produces a new snapshot which the engine publishes in one step, so a query
//! always sees one complete document set.
//!
//! Search is a brute-force cosine scan. The dataset is bounded, and a full
//! scan gives exact scores with ties kept in index order.

use crate::embedding::cosine_similarity;
use crate::record::VectorDocument;
use std::cmp::Ordering;

/// Search parameters for one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Maximum number of documents returned
    pub top_k: usize,
    /// Drop documents scoring below this similarity
    pub min_similarity: Option<f32>,
    /// Only consider documents of this type
    pub doc_type: Option<String>,
}

impl QueryOptions {
    /// Options returning the `top_k` best documents of any type
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            min_similarity: None,
            doc_type: None,
        }
    }

    /// Set a similarity floor
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = Some(min_similarity);
        self
    }

    /// Restrict results to one document type
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }
}

/// A document matched by a query
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    /// Matched document
    pub document: &'a VectorDocument,
    /// Cosine similarity to the query
    pub similarity: f32,
}

/// A fully built, read-only document set
#[derive(Debug)]
pub struct IndexSnapshot {
    documents: Vec<VectorDocument>,
    generation: u64,
}

impl IndexSnapshot {
    /// Wrap a complete document set
    pub fn new(documents: Vec<VectorDocument>, generation: u64) -> Self {
        Self {
            documents,
            generation,
        }
    }

    /// Build counter of this snapshot (first build is 1)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the snapshot holds no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All documents in index order
    pub fn documents(&self) -> &[VectorDocument] {
        &self.documents
    }

    /// Rank documents by similarity to `query`
    ///
    /// Sorting is stable: equal similarities keep their index order.
    pub fn search(&self, query: &[f32], options: &QueryOptions) -> Vec<Hit<'_>> {
        let mut hits: Vec<Hit<'_>> = self
            .documents
            .iter()
            .filter(|doc| {
                options
                    .doc_type
                    .as_deref()
                    .map_or(true, |t| doc.metadata.doc_type == t)
            })
            .map(|document| Hit {
                document,
                similarity: cosine_similarity(query, &document.embedding),
            })
            .filter(|hit| options.min_similarity.map_or(true, |min| hit.similarity >= min))
            .collect();

        hits.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        hits.truncate(options.top_k);
        hits
    }
}
