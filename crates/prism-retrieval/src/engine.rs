//! Retrieval engine lifecycle and query entry points

use crate::answer::{synthesize, RagResult};
use crate::embedding::{EmbeddingModel, HashingEmbeddingModel};
use crate::index::{IndexSnapshot, QueryOptions};
use crate::record::{PreparedRecord, VectorDocument};
use crate::{RetrievalConfig, RetrievalError, RetrievalResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    /// No index has been built (or the engine was disposed)
    Uninitialized,
    /// A build is running
    Indexing,
    /// An index is published and serving queries
    Ready,
}

struct Inner {
    state: IndexState,
    snapshot: Option<Arc<IndexSnapshot>>,
    /// Last generation handed to a build
    started: u64,
    /// Builds at or below this generation were cut off by `dispose`
    disposed_through: u64,
    /// Generations still building
    pending: BTreeSet<u64>,
}

impl Inner {
    fn settle(&mut self) {
        self.state = if !self.pending.is_empty() {
            IndexState::Indexing
        } else if self.snapshot.is_some() {
            IndexState::Ready
        } else {
            IndexState::Uninitialized
        };
    }
}

/// In-memory semantic search over host records
///
/// The engine owns its index exclusively. Queries take a cheap clone of the
/// current snapshot and never block a running build; a build publishes its
/// snapshot in one step when complete.
///
/// # Examples
///
/// ```
/// use prism_retrieval::RetrievalEngine;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), prism_retrieval::RetrievalError> {
/// let engine = RetrievalEngine::default_config();
/// engine
///     .initialize(vec![json!({"id": "r1", "answer": "The price is too high", "sampleSize": 40})])
///     .await?;
///
/// let result = engine.query("is the price too high?", 3)?;
/// assert_eq!(result.sources[0].id, "r1");
/// # Ok(())
/// # }
/// ```
pub struct RetrievalEngine {
    config: RetrievalConfig,
    model: Arc<dyn EmbeddingModel>,
    inner: RwLock<Inner>,
}

impl RetrievalEngine {
    /// Create an engine using the hashing embedding model
    pub fn new(config: RetrievalConfig) -> RetrievalResult<Self> {
        let model = Arc::new(HashingEmbeddingModel::new(config.dimension));
        Self::with_model(config, model)
    }

    /// Create an engine with default configuration
    pub fn default_config() -> Self {
        let config = RetrievalConfig::default();
        let model = Arc::new(HashingEmbeddingModel::new(config.dimension));
        Self::from_parts(config, model)
    }

    /// Create an engine with a custom embedding model
    ///
    /// # Errors
    /// Fails when the configuration is invalid or the model's dimension
    /// differs from the configured one.
    pub fn with_model(config: RetrievalConfig, model: Arc<dyn EmbeddingModel>) -> RetrievalResult<Self> {
        config.validate().map_err(RetrievalError::Config)?;
        if model.dimension() != config.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: config.dimension,
                actual: model.dimension(),
            });
        }

        Ok(Self::from_parts(config, model))
    }

    fn from_parts(config: RetrievalConfig, model: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            config,
            model,
            inner: RwLock::new(Inner {
                state: IndexState::Uninitialized,
                snapshot: None,
                started: 0,
                disposed_through: 0,
                pending: BTreeSet::new(),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> IndexState {
        self.read().state
    }

    /// Number of documents in the published index
    pub fn len(&self) -> usize {
        self.snapshot().map_or(0, |s| s.len())
    }

    /// Whether the published index is empty (or absent)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generation of the published index (0 before the first build)
    pub fn generation(&self) -> u64 {
        self.snapshot().map_or(0, |s| s.generation())
    }

    /// Build the first index
    ///
    /// Calling this on a ready engine re-indexes.
    pub async fn initialize(&self, records: Vec<Value>) -> RetrievalResult<usize> {
        let count = self.index(records).await?;
        tracing::info!("Retrieval engine initialized with {} documents", count);
        Ok(count)
    }

    /// Embed `records` and replace the index with them
    ///
    /// Embedding runs on blocking worker threads in batches. The new index is
    /// published only once every record is embedded; until then queries keep
    /// seeing the previous index. The state stays `Indexing` while any build
    /// is running. Returns the number of indexed documents.
    ///
    /// # Errors
    /// Returns [`RetrievalError::Superseded`] when the finished build was not
    /// published, because a newer index was already serving or the engine
    /// was disposed while it ran.
    pub async fn index(&self, records: Vec<Value>) -> RetrievalResult<usize> {
        let generation = {
            let mut inner = self.write();
            inner.started += 1;
            let generation = inner.started;
            inner.pending.insert(generation);
            inner.state = IndexState::Indexing;
            generation
        };

        match self.build(records, generation).await {
            Ok(snapshot) => self.publish(snapshot),
            Err(e) => {
                tracing::error!("Index build {} failed: {}", generation, e);
                let mut inner = self.write();
                inner.pending.remove(&generation);
                inner.settle();
                Err(e)
            }
        }
    }

    /// Answer a free-text question from the `top_k` most similar documents
    pub fn query(&self, question: &str, top_k: usize) -> RetrievalResult<RagResult> {
        self.query_with(question, &QueryOptions::new(top_k))
    }

    /// Answer a question with filtering options
    ///
    /// # Errors
    /// Returns [`RetrievalError::NotInitialized`] until the first index is
    /// published. An empty match set is not an error.
    pub fn query_with(&self, question: &str, options: &QueryOptions) -> RetrievalResult<RagResult> {
        let snapshot = self.snapshot().ok_or(RetrievalError::NotInitialized)?;
        let embedding = self.model.embed(question)?;

        let hits = snapshot.search(&embedding, options);
        tracing::debug!(
            "Query matched {} of {} documents (generation {})",
            hits.len(),
            snapshot.len(),
            snapshot.generation()
        );

        Ok(synthesize(question, &hits, snapshot.len(), self.config.snippet_chars))
    }

    /// Drop the index and return to the uninitialized state
    ///
    /// Builds still running are abandoned: they finish but never publish.
    pub fn dispose(&self) {
        let mut inner = self.write();
        inner.snapshot = None;
        inner.disposed_through = inner.started;
        inner.pending.clear();
        inner.settle();
        tracing::info!("Retrieval engine disposed");
    }

    async fn build(&self, records: Vec<Value>, generation: u64) -> RetrievalResult<IndexSnapshot> {
        let prepared: Vec<PreparedRecord> = records
            .iter()
            .enumerate()
            .map(|(position, record)| PreparedRecord::from_record(record, position))
            .collect();

        tracing::debug!(
            "Indexing {} records (generation {}, batch size {})",
            prepared.len(),
            generation,
            self.config.batch_size
        );

        let mut documents = Vec::with_capacity(prepared.len());
        let mut remaining = prepared.into_iter().peekable();
        while remaining.peek().is_some() {
            let batch: Vec<PreparedRecord> = remaining.by_ref().take(self.config.batch_size).collect();
            documents.extend(self.embed_batch(batch).await?);
        }

        Ok(IndexSnapshot::new(documents, generation))
    }

    async fn embed_batch(&self, batch: Vec<PreparedRecord>) -> RetrievalResult<Vec<VectorDocument>> {
        let model = Arc::clone(&self.model);
        let expected = self.config.dimension;

        tokio::task::spawn_blocking(move || {
            batch
                .into_iter()
                .map(|record| {
                    let embedding = model.embed(&record.text)?;
                    if embedding.len() != expected {
                        return Err(RetrievalError::DimensionMismatch {
                            expected,
                            actual: embedding.len(),
                        });
                    }
                    Ok(record.into_document(embedding))
                })
                .collect::<RetrievalResult<Vec<_>>>()
        })
        .await
        .map_err(|e| RetrievalError::Indexing(e.to_string()))?
    }

    fn publish(&self, snapshot: IndexSnapshot) -> RetrievalResult<usize> {
        let generation = snapshot.generation();
        let mut inner = self.write();
        inner.pending.remove(&generation);

        let current = inner.snapshot.as_ref().map_or(0, |s| s.generation());
        let outcome = if generation <= inner.disposed_through {
            tracing::debug!("Discarding index generation {} (engine disposed)", generation);
            Err(RetrievalError::Superseded { generation })
        } else if generation < current {
            // A slower, older build must not replace a newer one
            tracing::debug!(
                "Discarding index generation {} (generation {} already published)",
                generation,
                current
            );
            Err(RetrievalError::Superseded { generation })
        } else {
            tracing::info!(
                "Published index generation {} with {} documents",
                generation,
                snapshot.len()
            );
            let count = snapshot.len();
            inner.snapshot = Some(Arc::new(snapshot));
            Ok(count)
        };

        inner.settle();
        outcome
    }

    fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.read().snapshot.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RetrievalEngine {
    fn default() -> Self {
        Self::default_config()
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("documents", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({"id": "r1", "answer": "The price is too high for students", "type": "survey", "sampleSize": 200}),
            json!({"id": "r2", "answer": "Packaging looks premium and modern", "type": "interview", "sampleSize": 12}),
            json!({"id": "r3", "text": "Price matters less than quality", "type": "survey", "sampleSize": 80}),
        ]
    }

    #[test]
    fn test_query_before_initialize_fails() {
        let engine = RetrievalEngine::default_config();
        assert_eq!(engine.state(), IndexState::Uninitialized);
        assert_eq!(engine.query("price", 3).unwrap_err(), RetrievalError::NotInitialized);
    }

    #[tokio::test]
    async fn test_initialize_empty() {
        let engine = RetrievalEngine::default_config();
        assert_eq!(engine.initialize(Vec::new()).await.unwrap(), 0);

        let result = engine.query("anything at all", 5).unwrap();
        assert_eq!(result.confidence, 0);
        assert!(result.sources.is_empty());
        assert_eq!(result.related_questions.len(), 3);
    }

    #[tokio::test]
    async fn test_query_ranks_relevant_first() {
        let engine = RetrievalEngine::default_config();
        engine.initialize(records()).await.unwrap();
        assert_eq!(engine.state(), IndexState::Ready);
        assert_eq!(engine.len(), 3);

        let result = engine.query("is the price too high", 2).unwrap();
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].id, "r1");
        assert!(result.confidence > 0);
        assert!(result.answer.contains("responses"));
    }

    #[tokio::test]
    async fn test_query_with_type_filter() {
        let engine = RetrievalEngine::default_config();
        engine.initialize(records()).await.unwrap();

        let options = QueryOptions::new(5).with_doc_type("interview");
        let result = engine.query_with("price", &options).unwrap();
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].id, "r2");
    }

    #[tokio::test]
    async fn test_reindex_replaces_documents() {
        let config = RetrievalConfig {
            batch_size: 2,
            ..Default::default()
        };
        let engine = RetrievalEngine::new(config).unwrap();
        engine.initialize(records()).await.unwrap();
        assert_eq!(engine.generation(), 1);

        engine
            .index(vec![json!({"id": "n1", "text": "fresh batch"})])
            .await
            .unwrap();
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.len(), 1);

        let result = engine.query("price", 10).unwrap();
        assert!(result.sources.iter().all(|s| s.id == "n1"));
    }

    #[tokio::test]
    async fn test_dispose_returns_to_uninitialized() {
        let engine = RetrievalEngine::default_config();
        engine.initialize(records()).await.unwrap();

        engine.dispose();
        assert_eq!(engine.state(), IndexState::Uninitialized);
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.query("price", 3).unwrap_err(), RetrievalError::NotInitialized);
    }

    struct BrokenModel;

    impl EmbeddingModel for BrokenModel {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if text.contains("poison") {
                return Err(EmbeddingError::InferenceFailed("bad token".to_string()));
            }
            Ok(vec![1.0; 384])
        }

        fn dimension(&self) -> usize {
            384
        }
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_old_index() {
        let engine = RetrievalEngine::with_model(RetrievalConfig::default(), Arc::new(BrokenModel)).unwrap();
        engine.initialize(records()).await.unwrap();

        let err = engine
            .index(vec![json!({"text": "poison"})])
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
        assert_eq!(engine.state(), IndexState::Ready);
        assert_eq!(engine.len(), 3);
    }

    #[test]
    fn test_model_dimension_must_match_config() {
        let config = RetrievalConfig {
            dimension: 128,
            ..Default::default()
        };
        assert!(matches!(
            RetrievalEngine::with_model(config, Arc::new(BrokenModel)),
            Err(RetrievalError::DimensionMismatch { expected: 128, actual: 384 })
        ));
    }
}
