use std::collections::HashMap;

use chrono::{DateTime, Utc};
use qdrant_client::Payload;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    DeletePointsBuilder, Distance, FieldType, Filter, GetPointsBuilder, PointStruct, PointsIdsList,
    ScrollPointsBuilder, SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value,
    VectorParamsBuilder,
};
use tracing::{debug, info};

use super::error::IndexError;
use super::model::{
    ChunkHit, ChunkRecord, DocumentPage, DocumentQuery, DocumentRecord, KnnQuery, StoredDocument,
    point_id_for, postprocess_hits,
};

/// Page size used when walking the document collection.
const SCROLL_PAGE: u32 = 256;

/// Async interface over the document index, mockable for tests.
pub trait DocumentIndex: Send + Sync {
    /// Creates collections and payload indexes if missing.
    fn ensure_schema(
        &self,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Writes a document record and all of its chunks. The chunks of one
    /// document land as a unit; readers never observe a torn document.
    fn upsert_document(
        &self,
        document: DocumentRecord,
        chunks: Vec<ChunkRecord>,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Fetches a document by id, optionally with its chunks (embeddings
    /// are not loaded back).
    fn get_document(
        &self,
        document_id: &str,
        include_chunks: bool,
    ) -> impl std::future::Future<Output = Result<Option<StoredDocument>, IndexError>> + Send;

    /// Deletes a document and its chunks. Returns `false` when the id was
    /// unknown; deleting an unknown id has no side effects.
    fn delete_document(
        &self,
        document_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, IndexError>> + Send;

    /// Lists documents matching a text query and metadata filters, newest
    /// first.
    fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> impl std::future::Future<Output = Result<DocumentPage, IndexError>> + Send;

    /// Runs one kNN query and applies the shared post-processing
    /// (min-score drop, per-source cap, top-k truncation).
    fn knn_search(
        &self,
        query: &KnnQuery,
    ) -> impl std::future::Future<Output = Result<Vec<ChunkHit>, IndexError>> + Send;

    /// Number of stored documents.
    fn document_count(&self) -> impl std::future::Future<Output = Result<usize, IndexError>> + Send;

    /// Performs a basic health check request.
    fn health_check(&self) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;
}

/// Qdrant-backed [`DocumentIndex`].
///
/// Documents live as payload-only points in `<index>`; chunk vectors live
/// in `<index>_chunks` under cosine distance. Point ids are stable hashes
/// of the string ids; the string ids themselves ride in the payload.
#[derive(Clone)]
pub struct QdrantIndex {
    client: std::sync::Arc<Qdrant>,
    url: String,
    documents_collection: String,
    chunks_collection: String,
    dims: usize,
}

impl QdrantIndex {
    /// Creates a client for `url` over the named index.
    pub async fn new(url: &str, index: &str, dims: usize) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client: std::sync::Arc::new(client),
            url: url.to_string(),
            documents_collection: index.to_string(),
            chunks_collection: format!("{}_chunks", index),
            dims,
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn create_documents_collection(&self) -> Result<(), IndexError> {
        let exists = self
            .client
            .collection_exists(&self.documents_collection)
            .await
            .map_err(|e| IndexError::SchemaFailed {
                collection: self.documents_collection.clone(),
                message: e.to_string(),
            })?;

        if !exists {
            // Payload-only collection: document records carry no vectors.
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.documents_collection)
                        .on_disk_payload(true),
                )
                .await
                .map_err(|e| IndexError::SchemaFailed {
                    collection: self.documents_collection.clone(),
                    message: e.to_string(),
                })?;

            for field in ["title", "content"] {
                self.client
                    .create_field_index(CreateFieldIndexCollectionBuilder::new(
                        &self.documents_collection,
                        field,
                        FieldType::Text,
                    ))
                    .await
                    .map_err(|e| IndexError::SchemaFailed {
                        collection: self.documents_collection.clone(),
                        message: e.to_string(),
                    })?;
            }

            info!(collection = %self.documents_collection, "created document collection");
        }

        Ok(())
    }

    async fn create_chunks_collection(&self) -> Result<(), IndexError> {
        let exists = self
            .client
            .collection_exists(&self.chunks_collection)
            .await
            .map_err(|e| IndexError::SchemaFailed {
                collection: self.chunks_collection.clone(),
                message: e.to_string(),
            })?;

        if !exists {
            let vectors_config = VectorParamsBuilder::new(self.dims as u64, Distance::Cosine);

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.chunks_collection)
                        .vectors_config(vectors_config)
                        .on_disk_payload(true),
                )
                .await
                .map_err(|e| IndexError::SchemaFailed {
                    collection: self.chunks_collection.clone(),
                    message: e.to_string(),
                })?;

            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.chunks_collection,
                    "document_id",
                    FieldType::Keyword,
                ))
                .await
                .map_err(|e| IndexError::SchemaFailed {
                    collection: self.chunks_collection.clone(),
                    message: e.to_string(),
                })?;

            info!(collection = %self.chunks_collection, dims = self.dims, "created chunk collection");
        }

        Ok(())
    }

    async fn fetch_chunks(&self, document_id: &str) -> Result<Vec<ChunkRecord>, IndexError> {
        let filter = Filter::must([Condition::matches(
            "document_id",
            document_id.to_string(),
        )]);

        let mut chunks: Vec<ChunkRecord> = Vec::new();
        let mut offset = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(&self.chunks_collection)
                .filter(filter.clone())
                .limit(SCROLL_PAGE)
                .with_payload(true);
            if let Some(offset) = offset.take() {
                builder = builder.offset(offset);
            }

            let page =
                self.client
                    .scroll(builder)
                    .await
                    .map_err(|e| IndexError::GetFailed {
                        collection: self.chunks_collection.clone(),
                        message: e.to_string(),
                    })?;

            for point in page.result {
                chunks.push(chunk_from_payload(&point.payload, &self.chunks_collection)?);
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        chunks.sort_by_key(|c| c.position);
        Ok(chunks)
    }

    async fn fetch_matching_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<DocumentRecord>, IndexError> {
        let mut must: Vec<Condition> = query
            .filters
            .iter()
            .map(|(key, value)| Condition::matches(format!("metadata.{}", key), value.clone()))
            .collect();

        let mut should: Vec<Condition> = Vec::new();
        if let Some(text) = query.query.as_deref().filter(|t| !t.trim().is_empty()) {
            should.push(Condition::matches_text("title", text));
            should.push(Condition::matches_text("content", text));
        }

        let filter = if must.is_empty() && should.is_empty() {
            None
        } else {
            Some(Filter {
                must: std::mem::take(&mut must),
                should,
                ..Default::default()
            })
        };

        let mut documents: Vec<DocumentRecord> = Vec::new();
        let mut offset = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(&self.documents_collection)
                .limit(SCROLL_PAGE)
                .with_payload(true);
            if let Some(filter) = filter.clone() {
                builder = builder.filter(filter);
            }
            if let Some(offset) = offset.take() {
                builder = builder.offset(offset);
            }

            let page =
                self.client
                    .scroll(builder)
                    .await
                    .map_err(|e| IndexError::SearchFailed {
                        collection: self.documents_collection.clone(),
                        message: e.to_string(),
                    })?;

            for point in page.result {
                documents.push(document_from_payload(
                    &point.payload,
                    &self.documents_collection,
                )?);
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }
}

impl DocumentIndex for QdrantIndex {
    async fn ensure_schema(&self) -> Result<(), IndexError> {
        self.create_documents_collection().await?;
        self.create_chunks_collection().await
    }

    async fn upsert_document(
        &self,
        document: DocumentRecord,
        chunks: Vec<ChunkRecord>,
    ) -> Result<(), IndexError> {
        for chunk in &chunks {
            if chunk.embedding.len() != self.dims {
                return Err(IndexError::InvalidDimension {
                    expected: self.dims,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let document_id = document.document_id.clone();
        let doc_point = PointStruct::new(
            point_id_for(&document.document_id),
            HashMap::<String, Vec<f32>>::new(),
            document_payload(&document),
        );

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(&self.documents_collection, vec![doc_point]).wait(true),
            )
            .await
            .map_err(|e| IndexError::UpsertFailed {
                collection: self.documents_collection.clone(),
                message: e.to_string(),
            })?;

        if !chunks.is_empty() {
            let chunk_points: Vec<PointStruct> = chunks
                .into_iter()
                .map(|chunk| {
                    let payload = chunk_payload(&chunk);
                    PointStruct::new(point_id_for(&chunk.chunk_id), chunk.embedding, payload)
                })
                .collect();

            let chunk_upsert = self
                .client
                .upsert_points(
                    UpsertPointsBuilder::new(&self.chunks_collection, chunk_points).wait(true),
                )
                .await;

            if let Err(e) = chunk_upsert {
                // Roll the document record back so a half-written upload
                // never surfaces as a live document.
                let _ = self
                    .client
                    .delete_points(
                        DeletePointsBuilder::new(&self.documents_collection)
                            .points(PointsIdsList {
                                ids: vec![point_id_for(&document_id).into()],
                            })
                            .wait(true),
                    )
                    .await;

                return Err(IndexError::UpsertFailed {
                    collection: self.chunks_collection.clone(),
                    message: e.to_string(),
                });
            }
        }

        debug!(document_id = %document_id, "document upserted");
        Ok(())
    }

    async fn get_document(
        &self,
        document_id: &str,
        include_chunks: bool,
    ) -> Result<Option<StoredDocument>, IndexError> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(
                    &self.documents_collection,
                    vec![point_id_for(document_id).into()],
                )
                .with_payload(true),
            )
            .await
            .map_err(|e| IndexError::GetFailed {
                collection: self.documents_collection.clone(),
                message: e.to_string(),
            })?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let record = document_from_payload(&point.payload, &self.documents_collection)?;

        let chunks = if include_chunks {
            self.fetch_chunks(document_id).await?
        } else {
            Vec::new()
        };

        Ok(Some(StoredDocument { record, chunks }))
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool, IndexError> {
        let existing = self
            .client
            .get_points(
                GetPointsBuilder::new(
                    &self.documents_collection,
                    vec![point_id_for(document_id).into()],
                )
                .with_payload(false),
            )
            .await
            .map_err(|e| IndexError::GetFailed {
                collection: self.documents_collection.clone(),
                message: e.to_string(),
            })?;

        if existing.result.is_empty() {
            return Ok(false);
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.documents_collection)
                    .points(PointsIdsList {
                        ids: vec![point_id_for(document_id).into()],
                    })
                    .wait(true),
            )
            .await
            .map_err(|e| IndexError::DeleteFailed {
                collection: self.documents_collection.clone(),
                message: e.to_string(),
            })?;

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.chunks_collection)
                    .points(Filter::must([Condition::matches(
                        "document_id",
                        document_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await
            .map_err(|e| IndexError::DeleteFailed {
                collection: self.chunks_collection.clone(),
                message: e.to_string(),
            })?;

        info!(document_id = %document_id, "document deleted");
        Ok(true)
    }

    async fn search_documents(&self, query: &DocumentQuery) -> Result<DocumentPage, IndexError> {
        let mut documents = self.fetch_matching_documents(query).await?;
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = documents.len();
        let documents = documents
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(DocumentPage { documents, total })
    }

    async fn knn_search(&self, query: &KnnQuery) -> Result<Vec<ChunkHit>, IndexError> {
        if query.embedding.len() != self.dims {
            return Err(IndexError::InvalidDimension {
                expected: self.dims,
                actual: query.embedding.len(),
            });
        }

        let mut builder = SearchPointsBuilder::new(
            &self.chunks_collection,
            query.embedding.clone(),
            query.top_k as u64,
        )
        .with_payload(true)
        .score_threshold(query.min_score)
        .params(SearchParamsBuilder::default().hnsw_ef(query.num_candidates()));

        if !query.exclude_docs.is_empty() {
            builder = builder.filter(Filter {
                must_not: vec![Condition::matches(
                    "document_id",
                    query.exclude_docs.clone(),
                )],
                ..Default::default()
            });
        }

        let response =
            self.client
                .search_points(builder)
                .await
                .map_err(|e| IndexError::SearchFailed {
                    collection: self.chunks_collection.clone(),
                    message: e.to_string(),
                })?;

        let mut hits = Vec::with_capacity(response.result.len());
        for point in response.result {
            let chunk = chunk_from_payload(&point.payload, &self.chunks_collection)?;
            hits.push(ChunkHit {
                chunk_id: chunk.chunk_id,
                document_id: chunk.document_id,
                document_title: chunk.document_title,
                text: chunk.text,
                position: chunk.position,
                score: point.score,
            });
        }

        Ok(postprocess_hits(hits, query))
    }

    async fn document_count(&self) -> Result<usize, IndexError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.documents_collection).exact(true))
            .await
            .map_err(|e| IndexError::GetFailed {
                collection: self.documents_collection.clone(),
                message: e.to_string(),
            })?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn health_check(&self) -> Result<(), IndexError> {
        self.client
            .health_check()
            .await
            .map_err(|e| IndexError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

fn document_payload(document: &DocumentRecord) -> Payload {
    let metadata: serde_json::Map<String, serde_json::Value> = document
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();

    Payload::try_from(serde_json::json!({
        "document_id": document.document_id,
        "title": document.title,
        "content": document.content,
        "language": document.language,
        "metadata": metadata,
        "created_at": document.created_at.to_rfc3339(),
        "chunk_count": document.chunk_count as i64,
    }))
    .expect("document payload is a JSON object")
}

fn chunk_payload(chunk: &ChunkRecord) -> Payload {
    Payload::try_from(serde_json::json!({
        "chunk_id": chunk.chunk_id,
        "document_id": chunk.document_id,
        "document_title": chunk.document_title,
        "text": chunk.text,
        "position": chunk.position as i64,
        "word_count": chunk.word_count as i64,
    }))
    .expect("chunk payload is a JSON object")
}

fn document_from_payload(
    payload: &HashMap<String, Value>,
    collection: &str,
) -> Result<DocumentRecord, IndexError> {
    let created_at = required_str(payload, "created_at", collection)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IndexError::MalformedPayload {
            collection: collection.to_string(),
            message: format!("bad created_at: {}", e),
        })?;

    let metadata = payload
        .get("metadata")
        .and_then(|value| value.kind.as_ref())
        .and_then(|kind| match kind {
            Kind::StructValue(object) => Some(object),
            _ => None,
        })
        .map(|object| {
            object
                .fields
                .iter()
                .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(DocumentRecord {
        document_id: required_str(payload, "document_id", collection)?,
        title: optional_str(payload, "title"),
        content: optional_str(payload, "content"),
        language: optional_str(payload, "language"),
        metadata,
        created_at,
        chunk_count: optional_int(payload, "chunk_count") as usize,
    })
}

fn chunk_from_payload(
    payload: &HashMap<String, Value>,
    collection: &str,
) -> Result<ChunkRecord, IndexError> {
    Ok(ChunkRecord {
        chunk_id: required_str(payload, "chunk_id", collection)?,
        document_id: required_str(payload, "document_id", collection)?,
        document_title: optional_str(payload, "document_title"),
        text: optional_str(payload, "text"),
        position: optional_int(payload, "position") as usize,
        word_count: optional_int(payload, "word_count") as usize,
        embedding: Vec::new(),
    })
}

fn required_str(
    payload: &HashMap<String, Value>,
    key: &str,
    collection: &str,
) -> Result<String, IndexError> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| IndexError::MalformedPayload {
            collection: collection.to_string(),
            message: format!("missing field '{}'", key),
        })
}

fn optional_str(payload: &HashMap<String, Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn optional_int(payload: &HashMap<String, Value>, key: &str) -> i64 {
    payload.get(key).and_then(|v| v.as_integer()).unwrap_or(0)
}
