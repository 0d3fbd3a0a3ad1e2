//! Document ingestion: chunk, embed, and store.

pub mod error;


pub use error::IngestError;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::chunker::{TextChunker, detect_language};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::vectordb::{ChunkRecord, DocumentIndex, DocumentRecord};

/// Hard cap on document size.
const MAX_DOCUMENT_BYTES: usize = 8 * 1024 * 1024;

/// One document to ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// ISO-like 2-letter code, `"auto"`, or absent (same as auto).
    #[serde(default)]
    pub language: Option<String>,
    /// Caller-supplied id; a UUID is generated when absent.
    #[serde(default)]
    pub document_id: Option<String>,
}

/// Successful upload summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub document_id: String,
    pub title: String,
    pub chunks_created: usize,
}

/// Per-document entry in a batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub title: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub chunks_created: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a batch ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

/// Ingestion pipeline over the shared embedder and index.
pub struct DocumentIngestor<E: Embedder, I: DocumentIndex> {
    embedder: Arc<E>,
    index: Arc<I>,
    chunker: TextChunker,
    config: Config,
}

impl<E: Embedder, I: DocumentIndex> DocumentIngestor<E, I> {
    pub fn new(embedder: Arc<E>, index: Arc<I>, config: Config) -> Self {
        let chunker = TextChunker::from_config(&config);
        Self {
            embedder,
            index,
            chunker,
            config,
        }
    }

    /// Chunks, embeds, and stores one document.
    ///
    /// Fails atomically: on a store failure nothing of the document
    /// remains visible. Content that yields no chunks is rejected.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, IngestError> {
        if request.content.len() > MAX_DOCUMENT_BYTES {
            return Err(IngestError::InvalidArgument(format!(
                "document of {} bytes exceeds the {} byte limit",
                request.content.len(),
                MAX_DOCUMENT_BYTES
            )));
        }

        let document_id = match request.document_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        let language = match request.language.as_deref() {
            Some(lang) if !lang.is_empty() && lang != "auto" => lang.to_string(),
            _ => detect_language(&request.content).to_string(),
        };

        let chunks = self.chunker.chunk_text(&request.content);
        if chunks.is_empty() {
            return Err(IngestError::InvalidArgument(
                "document content is too short to process".to_string(),
            ));
        }

        let chunk_texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embed_deadline = Duration::from_secs(self.config.ollama_timeout_secs);
        let embeddings =
            match tokio::time::timeout(embed_deadline, self.embedder.embed_batch(&chunk_texts))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(IngestError::DeadlineExceeded { stage: "embedding" }),
            };

        if embeddings.len() != chunks.len() {
            return Err(IngestError::Internal(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let chunk_records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord {
                chunk_id: ChunkRecord::id_for(&document_id, chunk.position),
                document_id: document_id.clone(),
                document_title: request.title.clone(),
                text: chunk.text.clone(),
                position: chunk.position,
                word_count: chunk.word_count,
                embedding,
            })
            .collect();

        let chunks_created = chunk_records.len();
        let record = DocumentRecord {
            document_id: document_id.clone(),
            title: request.title.clone(),
            content: request.content,
            language,
            metadata: request.metadata,
            created_at: Utc::now(),
            chunk_count: chunks_created,
        };

        self.index.upsert_document(record, chunk_records).await?;

        info!(document_id = %document_id, chunks = chunks_created, "document uploaded");

        Ok(UploadOutcome {
            document_id,
            title: request.title,
            chunks_created,
        })
    }

    /// Ingests documents sequentially, keeping memory bounded.
    ///
    /// Unlike a single upload, per-document failures do not abort the
    /// batch; each is recorded in the report.
    #[instrument(skip(self, requests), fields(documents = requests.len()))]
    pub async fn batch_upload(&self, requests: Vec<UploadRequest>) -> BatchReport {
        let total_documents = requests.len();
        let mut results = Vec::with_capacity(total_documents);
        let mut successful = 0;
        let mut failed = 0;

        for request in requests {
            let title = request.title.clone();
            match self.upload(request).await {
                Ok(outcome) => {
                    successful += 1;
                    results.push(BatchItem {
                        title,
                        success: true,
                        document_id: Some(outcome.document_id),
                        chunks_created: outcome.chunks_created,
                        error: None,
                    });
                }
                Err(e) => {
                    failed += 1;
                    results.push(BatchItem {
                        title,
                        success: false,
                        document_id: None,
                        chunks_created: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        BatchReport {
            total_documents,
            successful,
            failed,
            results,
        }
    }
}
