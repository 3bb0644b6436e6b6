//! Text vectorization for similarity search
//!
//! The bundled [`HashingEmbeddingModel`] is a bag-of-words hash: each token
//! lands in one of `D` buckets and the count vector is L2-normalized. Hash
//! collisions are accepted. Buckets come from SHA-256, so an embedding is
//! the same across processes, platforms and toolchains. Any replacement model must keep the contract:
//! fixed dimension, deterministic output, unit length (or all zeros).
//!
//! # Examples
//!
//! ```rust
//! use prism_retrieval::embedding::{EmbeddingModel, HashingEmbeddingModel};
//!
//! let model = HashingEmbeddingModel::new(384);
//! let embedding = model.embed("Price feels too high").unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces the same embedding
//! assert_eq!(embedding, model.embed("price FEELS too high!").unwrap());
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Invalid input text or model setup
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
///
/// Implementations are shared with blocking worker threads, hence the
/// `Send + Sync` bound.
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Token-hashing embedding model
///
/// A token's bucket is the first 8 bytes of its SHA-256 digest (little
/// endian) modulo the dimension.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a new hashing model with `dimension` buckets
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimension as u64) as usize
    }
}

/// Lowercase alphanumeric tokens of `text`
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

impl EmbeddingModel for HashingEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "embedding dimension must be positive".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            embedding[self.bucket(&token)] += 1.0;
        }

        // Zero vector stays zero
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
