//! Prism Retrieval Engine
//!
//! Answers free-text questions over indexed simulation artifacts. Records are
//! embedded into fixed-dimension vectors, ranked by cosine similarity, and the
//! best matches are summarized into a [`RagResult`].
//!
//! ## Lifecycle
//!
//! `Uninitialized → Indexing → Ready`. Queries before the first build fail
//! with [`RetrievalError::NotInitialized`]; re-indexing swaps in a complete
//! new snapshot while the old one keeps serving. A build that finishes after
//! a newer index was published, or after `dispose`, is discarded with
//! [`RetrievalError::Superseded`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod answer;
mod config;
pub mod embedding;
mod engine;
mod error;
pub mod index;
pub mod record;

pub use answer::{RagResult, RetrievedSource, RELATED_QUESTIONS};
pub use config::RetrievalConfig;
pub use embedding::{cosine_similarity, EmbeddingError, EmbeddingModel, HashingEmbeddingModel};
pub use engine::{IndexState, RetrievalEngine};
pub use error::{RetrievalError, RetrievalResult};
pub use index::{IndexSnapshot, QueryOptions};
pub use record::{DocumentMetadata, VectorDocument};
