use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use veriscan::detector::{CheckOptions, Verdict};
use veriscan::vectordb::{DocumentRecord, StoredDocument};

/// Body of `POST /v1/check`.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub text: String,
    #[serde(default)]
    pub options: Option<CheckOptions>,
}

/// Body of `POST /v1/documents` responses.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub chunks_created: usize,
    pub success: bool,
    pub message: String,
}

/// Body of `DELETE /v1/documents/{id}` responses.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Query flags for `GET /v1/documents/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct GetDocumentParams {
    #[serde(default)]
    pub include_content: bool,
    #[serde(default)]
    pub include_chunks: bool,
}

/// A document record without its content, for listings.
#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub title: String,
    pub language: String,
    pub metadata: HashMap<String, String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub chunk_count: usize,
}

impl From<DocumentRecord> for DocumentSummary {
    fn from(record: DocumentRecord) -> Self {
        Self {
            document_id: record.document_id,
            title: record.title,
            language: record.language,
            metadata: record.metadata,
            created_at: record.created_at,
            chunk_count: record.chunk_count,
        }
    }
}

/// Body of `GET /v1/documents` responses.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
}

/// Body of `GET /v1/documents/{id}` responses.
#[derive(Debug, Serialize)]
pub struct GetDocumentResponse {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<ChunkSummary>,
}

/// One chunk in a document response or a PDF chunk report.
#[derive(Debug, Serialize)]
pub struct ChunkSummary {
    pub chunk_id: String,
    pub position: usize,
    pub word_count: usize,
    pub text: String,
}

impl GetDocumentResponse {
    pub fn from_stored(stored: StoredDocument, include_content: bool) -> Self {
        let chunks = stored
            .chunks
            .into_iter()
            .map(|chunk| ChunkSummary {
                chunk_id: chunk.chunk_id,
                position: chunk.position,
                word_count: chunk.word_count,
                text: chunk.text,
            })
            .collect();

        let content = include_content.then_some(stored.record.content.clone());

        Self {
            summary: stored.record.into(),
            content,
            chunks,
        }
    }
}

/// Body of `POST /v1/pdf/index`.
#[derive(Debug, Deserialize)]
pub struct PdfIndexRequest {
    pub bucket: String,
    pub object_path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Body of `POST /v1/pdf/index` responses.
#[derive(Debug, Serialize)]
pub struct PdfIndexResponse {
    pub document_id: String,
    pub chunks_created: usize,
    pub success: bool,
    pub total_pages: usize,
    pub discarded_segments: usize,
    pub chunks: Vec<ChunkSummary>,
}

/// Body of `POST /v1/pdf/check`.
#[derive(Debug, Deserialize)]
pub struct PdfCheckRequest {
    pub bucket: String,
    pub object_path: String,
    #[serde(default)]
    pub options: Option<CheckOptions>,
}

/// PDF-specific timings attached to a PDF check.
#[derive(Debug, Serialize)]
pub struct PdfMetrics {
    pub extraction_time_ms: u64,
    pub total_pages: usize,
    pub discarded_segments: usize,
}

/// Body of `POST /v1/pdf/check` responses.
#[derive(Debug, Serialize)]
pub struct PdfCheckResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub pdf_metrics: PdfMetrics,
}

/// One component probe in the health response.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /healthz` responses.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub vector_store: ComponentHealth,
    pub embedder: ComponentHealth,
}
