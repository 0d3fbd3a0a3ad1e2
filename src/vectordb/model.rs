use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document record stored alongside its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque id (UUID unless caller-supplied).
    pub document_id: String,
    pub title: String,
    pub content: String,
    /// ISO-like 2-letter code or `"unknown"`.
    pub language: String,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub chunk_count: usize,
}

/// A chunk as stored in the index, embedding included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// `"<doc_id>#<position>"`.
    pub chunk_id: String,
    pub document_id: String,
    pub document_title: String,
    pub text: String,
    pub position: usize,
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Builds the canonical chunk id for a document position.
    pub fn id_for(document_id: &str, position: usize) -> String {
        format!("{}#{}", document_id, position)
    }
}

/// A document plus (optionally) its chunks, as returned by lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(flatten)]
    pub record: DocumentRecord,
    /// Populated only when chunks were requested; embeddings are not
    /// loaded back.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<ChunkRecord>,
}

/// One kNN candidate returned by the index.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub chunk_id: String,
    pub document_id: String,
    pub document_title: String,
    pub text: String,
    pub position: usize,
    /// Cosine similarity, clamped to `[0, 1]`.
    pub score: f32,
}

/// Parameters for one kNN query.
#[derive(Debug, Clone)]
pub struct KnnQuery {
    pub embedding: Vec<f32>,
    /// Maximum candidates returned after post-processing.
    pub top_k: usize,
    /// Raw scores below this are dropped.
    pub min_score: f32,
    /// Documents excluded from the search.
    pub exclude_docs: Vec<String>,
    /// Per-source candidate cap.
    pub max_per_source: usize,
}

impl KnnQuery {
    /// ANN candidate pool handed to the engine, `max(100, 10·k)`.
    pub fn num_candidates(&self) -> u64 {
        (self.top_k as u64 * 10).max(100)
    }
}

/// Filtered, paginated document listing request.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Full-text query over title and content.
    pub query: Option<String>,
    /// Metadata equality filters.
    pub filters: HashMap<String, String>,
    pub limit: usize,
    pub offset: usize,
}

/// One page of document records.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<DocumentRecord>,
    /// Total matches before pagination.
    pub total: usize,
}

/// Derives a stable u64 point id from a string id.
pub fn point_id_for(id: &str) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for &b in id.as_bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Applies the shared kNN post-processing: clamp negative scores to zero,
/// drop scores below `min_score`, cap candidates per source document, and
/// truncate to `top_k`. `hits` must already be sorted by score descending.
pub fn postprocess_hits(hits: Vec<ChunkHit>, query: &KnnQuery) -> Vec<ChunkHit> {
    let kept = hits
        .into_iter()
        .map(|mut hit| {
            hit.score = hit.score.max(0.0);
            hit
        })
        .filter(|hit| hit.score >= query.min_score)
        .collect();

    let mut capped = cap_per_source(kept, query.max_per_source);
    capped.truncate(query.top_k);
    capped
}

/// Keeps at most `max_per_source` hits per source document, preserving
/// order, so a single long source cannot crowd out the candidate list.
pub fn cap_per_source(hits: Vec<ChunkHit>, max_per_source: usize) -> Vec<ChunkHit> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(hits.len());

    for hit in hits {
        let count = counts.entry(hit.document_id.clone()).or_insert(0);
        if *count < max_per_source {
            *count += 1;
            kept.push(hit);
        }
    }

    kept
}
