use std::sync::atomic::{AtomicBool, Ordering};

use super::Embedder;
use super::error::EmbeddingError;
use super::ollama::EmbedderHealth;

/// Deterministic in-process embedder for tests.
///
/// Each text maps to a bag-of-words vector: every lowercased token is
/// hashed into one of `dims` buckets and counted. Identical texts always
/// produce identical vectors, and texts sharing most of their tokens land
/// close under cosine similarity, which is enough to exercise the scoring
/// pipeline without a model server.
#[derive(Debug)]
pub struct MockEmbedder {
    dims: usize,
    fail: AtomicBool,
}

impl MockEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            fail: AtomicBool::new(false),
        }
    }

    /// Makes subsequent calls fail with an `Unavailable` error.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Embeds a single text (test convenience).
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text.to_lowercase().split_whitespace() {
            let bucket = (fnv1a(token.as_bytes()) % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable {
                attempts: 1,
                message: "mock embedder set to fail".to_string(),
            });
        }

        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn health_check(&self) -> Result<EmbedderHealth, EmbeddingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable {
                attempts: 1,
                message: "mock embedder set to fail".to_string(),
            });
        }

        Ok(EmbedderHealth {
            models: vec!["mock".to_string()],
            embed_model_available: true,
        })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
