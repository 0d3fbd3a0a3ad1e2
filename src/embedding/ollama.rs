use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;

use super::Embedder;
use super::error::EmbeddingError;

/// Health probe result for the embedding backend.
#[derive(Debug, Clone)]
pub struct EmbedderHealth {
    /// Models reported by the backend.
    pub models: Vec<String>,
    /// Whether the configured embedding model is among them.
    pub embed_model_available: bool,
}

/// Client for the Ollama `/api/embed` endpoint.
///
/// Requests are grouped into batches of at most `batch_size` texts.
/// Transient failures (transport errors, HTTP 429 and 5xx) are retried
/// with exponential backoff; other statuses fail immediately.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dims: usize,
    batch_size: usize,
    max_retries: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

impl OllamaEmbedder {
    /// Creates a client for `base_url` with explicit parameters.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dims: usize,
        batch_size: usize,
        max_retries: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Unavailable {
                attempts: 0,
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            dims,
            batch_size: batch_size.max(1),
            max_retries: max_retries.max(1),
        })
    }

    /// Creates a client from the service configuration.
    pub fn from_config(config: &Config) -> Result<Self, EmbeddingError> {
        Self::new(
            config.ollama_host.clone(),
            config.ollama_embed_model.clone(),
            config.embedding_dims,
            config.embedding_batch_size,
            config.embedding_max_retries,
            Duration::from_secs(config.ollama_timeout_secs),
        )
    }

    /// Returns the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn embed_unique(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let mut batch_vectors = self.call_with_retry(batch).await?;

            if batch_vectors.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    sent: batch.len(),
                    received: batch_vectors.len(),
                });
            }

            for vector in &batch_vectors {
                if vector.len() != self.dims {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.dims,
                        actual: vector.len(),
                    });
                }
            }

            vectors.append(&mut batch_vectors);
        }

        Ok(vectors)
    }

    async fn call_with_retry(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: batch,
        };

        let mut last_err = String::new();

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                warn!(attempt, delay_secs = delay.as_secs(), "retrying embed call");
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_err = e.to_string();
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                let body: serde_json::Value =
                    response
                        .json()
                        .await
                        .map_err(|e| EmbeddingError::MalformedResponse {
                            message: e.to_string(),
                        })?;
                return parse_embed_response(&body);
            }

            let body_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 || status.is_server_error() {
                last_err = format!("status {}: {}", status, body_text);
                continue;
            }

            return Err(EmbeddingError::Rejected {
                status: status.as_u16(),
                message: body_text,
            });
        }

        Err(EmbeddingError::Unavailable {
            attempts: self.max_retries,
            message: last_err,
        })
    }
}

impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Embed each distinct text once; repeated chunks within a request
        // must map to the same vector.
        let mut unique: Vec<String> = Vec::new();
        let mut index_of: HashMap<&String, usize> = HashMap::new();
        for text in texts {
            if !index_of.contains_key(text) {
                index_of.insert(text, unique.len());
                unique.push(text.clone());
            }
        }

        debug!(
            texts = texts.len(),
            unique = unique.len(),
            model = %self.model,
            "embedding batch"
        );

        let vectors = self.embed_unique(&unique).await?;

        Ok(texts
            .iter()
            .map(|text| vectors[index_of[text]].clone())
            .collect())
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn health_check(&self) -> Result<EmbedderHealth, EmbeddingError> {
        let url = format!("{}/api/tags", self.base_url);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| EmbeddingError::Unavailable {
                    attempts: 1,
                    message: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::MalformedResponse {
                    message: e.to_string(),
                })?;

        let models: Vec<String> = body
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let embed_model_available = models.iter().any(|name| name.contains(&self.model));

        Ok(EmbedderHealth {
            models,
            embed_model_available,
        })
    }
}

/// Extracts vectors from an `/api/embed` response.
///
/// Newer Ollama returns `{"embeddings": [[...], ...]}`; older builds return
/// a single `{"embedding": [...]}`.
fn parse_embed_response(body: &serde_json::Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if let Some(embeddings) = body.get("embeddings").and_then(|e| e.as_array()) {
        return embeddings
            .iter()
            .map(|embedding| {
                embedding
                    .as_array()
                    .map(|values| {
                        values
                            .iter()
                            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                            .collect()
                    })
                    .ok_or_else(|| EmbeddingError::MalformedResponse {
                        message: "embedding entry is not an array".to_string(),
                    })
            })
            .collect();
    }

    if let Some(embedding) = body.get("embedding").and_then(|e| e.as_array()) {
        return Ok(vec![
            embedding
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect(),
        ]);
    }

    Err(EmbeddingError::MalformedResponse {
        message: "response carries neither 'embeddings' nor 'embedding'".to_string(),
    })
}
