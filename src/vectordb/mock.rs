use std::collections::HashMap;
use std::sync::RwLock;

use super::error::IndexError;
use super::client::DocumentIndex;
use super::model::{
    ChunkHit, ChunkRecord, DocumentPage, DocumentQuery, DocumentRecord, KnnQuery, StoredDocument,
    postprocess_hits,
};

/// In-memory [`DocumentIndex`] with exact cosine search, for tests.
#[derive(Default)]
pub struct MockIndex {
    inner: RwLock<MockState>,
}

#[derive(Default)]
struct MockState {
    documents: HashMap<String, DocumentRecord>,
    chunks: Vec<ChunkRecord>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks across all documents (test convenience).
    pub fn chunk_count(&self) -> usize {
        self.inner.read().map(|state| state.chunks.len()).unwrap_or(0)
    }

    fn poisoned<T>(collection: &str) -> Result<T, IndexError> {
        Err(IndexError::GetFailed {
            collection: collection.to_string(),
            message: "lock poisoned".to_string(),
        })
    }
}

impl DocumentIndex for MockIndex {
    async fn ensure_schema(&self) -> Result<(), IndexError> {
        Ok(())
    }

    async fn upsert_document(
        &self,
        document: DocumentRecord,
        chunks: Vec<ChunkRecord>,
    ) -> Result<(), IndexError> {
        let Ok(mut state) = self.inner.write() else {
            return Self::poisoned("mock");
        };

        state.chunks.retain(|c| c.document_id != document.document_id);
        state.chunks.extend(chunks);
        state
            .documents
            .insert(document.document_id.clone(), document);
        Ok(())
    }

    async fn get_document(
        &self,
        document_id: &str,
        include_chunks: bool,
    ) -> Result<Option<StoredDocument>, IndexError> {
        let Ok(state) = self.inner.read() else {
            return Self::poisoned("mock");
        };

        let Some(record) = state.documents.get(document_id).cloned() else {
            return Ok(None);
        };

        let chunks = if include_chunks {
            let mut chunks: Vec<ChunkRecord> = state
                .chunks
                .iter()
                .filter(|c| c.document_id == document_id)
                .cloned()
                .map(|mut c| {
                    c.embedding = Vec::new();
                    c
                })
                .collect();
            chunks.sort_by_key(|c| c.position);
            chunks
        } else {
            Vec::new()
        };

        Ok(Some(StoredDocument { record, chunks }))
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool, IndexError> {
        let Ok(mut state) = self.inner.write() else {
            return Self::poisoned("mock");
        };

        if state.documents.remove(document_id).is_none() {
            return Ok(false);
        }

        state.chunks.retain(|c| c.document_id != document_id);
        Ok(true)
    }

    async fn search_documents(&self, query: &DocumentQuery) -> Result<DocumentPage, IndexError> {
        let Ok(state) = self.inner.read() else {
            return Self::poisoned("mock");
        };

        let needle = query
            .query
            .as_deref()
            .map(|q| q.to_lowercase())
            .filter(|q| !q.trim().is_empty());

        let mut matches: Vec<DocumentRecord> = state
            .documents
            .values()
            .filter(|doc| {
                let text_match = needle.as_deref().is_none_or(|needle| {
                    doc.title.to_lowercase().contains(needle)
                        || doc.content.to_lowercase().contains(needle)
                });
                let meta_match = query
                    .filters
                    .iter()
                    .all(|(k, v)| doc.metadata.get(k) == Some(v));
                text_match && meta_match
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len();
        let documents = matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(DocumentPage { documents, total })
    }

    async fn knn_search(&self, query: &KnnQuery) -> Result<Vec<ChunkHit>, IndexError> {
        let Ok(state) = self.inner.read() else {
            return Self::poisoned("mock");
        };

        let mut hits: Vec<ChunkHit> = state
            .chunks
            .iter()
            .filter(|chunk| !query.exclude_docs.contains(&chunk.document_id))
            .map(|chunk| ChunkHit {
                chunk_id: chunk.chunk_id.clone(),
                document_id: chunk.document_id.clone(),
                document_title: chunk.document_title.clone(),
                text: chunk.text.clone(),
                position: chunk.position,
                score: cosine_similarity(&query.embedding, &chunk.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(postprocess_hits(hits, query))
    }

    async fn document_count(&self) -> Result<usize, IndexError> {
        let Ok(state) = self.inner.read() else {
            return Self::poisoned("mock");
        };
        Ok(state.documents.len())
    }

    async fn health_check(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Exact cosine similarity, used by the mock in place of ANN search.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
