//! Embedding generation against an external model server.
//!
//! [`OllamaEmbedder`] talks to an Ollama instance; [`MockEmbedder`] provides
//! deterministic vectors for tests.

pub mod error;
mod ollama;

#[cfg(any(test, feature = "mock"))]
mod mock;

#[cfg(test)]
mod tests;

pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use ollama::{EmbedderHealth, OllamaEmbedder};

/// Batched embedding interface used by the detector and the ingestor.
pub trait Embedder: Send + Sync {
    /// Embeds `texts` into vectors of [`Embedder::dims`] length, one per
    /// input and in input order. Duplicate texts are embedded once per
    /// call so a request sees a consistent vector for repeated chunks.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;

    /// Embedding dimension produced by this embedder.
    fn dims(&self) -> usize;

    /// Probes the embedding backend.
    fn health_check(
        &self,
    ) -> impl std::future::Future<Output = Result<EmbedderHealth, EmbeddingError>> + Send;
}
