use std::collections::HashMap;
use std::time::Instant;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, instrument, warn};

use veriscan::analysis::Analyzer;
use veriscan::detector::{CheckOptions, Verdict};
use veriscan::embedding::Embedder;
use veriscan::ingest::{BatchReport, UploadRequest};
use veriscan::vectordb::{DocumentIndex, DocumentQuery};

use super::error::ApiError;
use super::payload::{
    CheckRequest, ChunkSummary, ComponentHealth, DeleteResponse, GetDocumentParams,
    GetDocumentResponse, HealthResponse, PdfCheckRequest, PdfCheckResponse, PdfIndexRequest,
    PdfIndexResponse, PdfMetrics, SearchResponse, UploadResponse,
};
use super::state::AppState;

#[instrument(skip(state, request), fields(text_len = request.text.len()))]
pub async fn check_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<Verdict>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let options = request.options.unwrap_or_default();
    let mut verdict = state.detector.check(&request.text, &options).await?;

    attach_ai_analysis(&state, &options, &request.text, &mut verdict).await;

    Ok(Json(verdict))
}

/// Runs the optional AI hook. Failures only cost the commentary; the
/// numeric verdict is already final.
async fn attach_ai_analysis<E, I>(
    state: &AppState<E, I>,
    options: &CheckOptions,
    text: &str,
    verdict: &mut Verdict,
) where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    if !options.include_ai_analysis || verdict.matches.is_empty() {
        return;
    }

    let Some(analyzer) = &state.analyzer else {
        return;
    };

    match analyzer
        .analyze(text, &verdict.matches, verdict.plagiarism_percentage)
        .await
    {
        Ok(analysis) => verdict.ai_analysis = Some(analysis),
        Err(e) => warn!(error = %e, "AI analysis unavailable, continuing without it"),
    }
}

#[instrument(skip(state, request), fields(title = %request.title))]
pub async fn upload_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let outcome = state.ingestor.upload(request).await?;

    Ok(Json(UploadResponse {
        document_id: outcome.document_id,
        message: format!("uploaded with {} chunks", outcome.chunks_created),
        chunks_created: outcome.chunks_created,
        success: true,
    }))
}

#[instrument(skip(state, requests), fields(documents = requests.len()))]
pub async fn batch_upload_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Json(requests): Json<Vec<UploadRequest>>,
) -> Result<Json<BatchReport>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    if requests.is_empty() {
        return Err(ApiError::InvalidArgument(
            "batch contains no documents".to_string(),
        ));
    }

    let report = state.ingestor.batch_upload(requests).await;
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn get_document_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Path(document_id): Path<String>,
    Query(params): Query<GetDocumentParams>,
) -> Result<Json<GetDocumentResponse>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let stored = state
        .index
        .get_document(&document_id, params.include_chunks)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {}", document_id)))?;

    Ok(Json(GetDocumentResponse::from_stored(
        stored,
        params.include_content,
    )))
}

#[instrument(skip(state))]
pub async fn delete_document_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    // Unknown ids are not an error here: the response records whether
    // anything was deleted.
    let success = state.index.delete_document(&document_id).await?;
    Ok(Json(DeleteResponse { success }))
}

#[instrument(skip(state, params))]
pub async fn search_documents_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResponse>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let query = parse_search_params(&params)?;
    let page = state.index.search_documents(&query).await?;

    Ok(Json(SearchResponse {
        documents: page.documents.into_iter().map(Into::into).collect(),
        total: page.total,
    }))
}

/// Parses `q`, `limit`, `offset`, and `filter.<key>` query parameters.
pub(crate) fn parse_search_params(
    params: &HashMap<String, String>,
) -> Result<DocumentQuery, ApiError> {
    let limit = match params.get("limit") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::InvalidArgument(format!("bad limit '{}'", raw)))?,
        None => 10,
    };
    let offset = match params.get("offset") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::InvalidArgument(format!("bad offset '{}'", raw)))?,
        None => 0,
    };

    let filters: HashMap<String, String> = params
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("filter.")
                .map(|name| (name.to_string(), value.clone()))
        })
        .collect();

    Ok(DocumentQuery {
        query: params.get("q").cloned(),
        filters,
        limit,
        offset,
    })
}

#[instrument(skip(state))]
pub async fn health_handler<E, I>(State(state): State<AppState<E, I>>) -> Response
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let vector_store = probe(async {
        state
            .index
            .health_check()
            .await
            .map_err(|e| e.to_string())
    })
    .await;

    let embedder = probe(async {
        state
            .embedder
            .health_check()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
    .await;

    let healthy = vector_store.healthy && embedder.healthy;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            healthy,
            vector_store,
            embedder,
        }),
    )
        .into_response()
}

async fn probe<F>(check: F) -> ComponentHealth
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let started = Instant::now();
    let result = check.await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => ComponentHealth {
            healthy: true,
            latency_ms,
            error: None,
        },
        Err(error) => ComponentHealth {
            healthy: false,
            latency_ms,
            error: Some(error),
        },
    }
}

#[instrument(skip(state, request), fields(bucket = %request.bucket, object = %request.object_path))]
pub async fn pdf_index_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Json(request): Json<PdfIndexRequest>,
) -> Result<Json<PdfIndexResponse>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let extraction = fetch_and_extract(&state, &request.bucket, &request.object_path).await?;

    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(&request.object_path));

    let outcome = state
        .ingestor
        .upload(UploadRequest {
            title,
            content: extraction.text,
            metadata: request.metadata,
            language: request.language,
            document_id: None,
        })
        .await?;

    // Per-chunk report for the caller, read back from the index.
    let chunks = state
        .index
        .get_document(&outcome.document_id, true)
        .await?
        .map(|stored| {
            stored
                .chunks
                .into_iter()
                .map(|chunk| ChunkSummary {
                    chunk_id: chunk.chunk_id,
                    position: chunk.position,
                    word_count: chunk.word_count,
                    text: chunk.text,
                })
                .collect()
        })
        .unwrap_or_default();

    info!(document_id = %outcome.document_id, "PDF indexed");

    Ok(Json(PdfIndexResponse {
        document_id: outcome.document_id,
        chunks_created: outcome.chunks_created,
        success: true,
        total_pages: extraction.total_pages,
        discarded_segments: extraction.discarded_segments,
        chunks,
    }))
}

#[instrument(skip(state, request), fields(bucket = %request.bucket, object = %request.object_path))]
pub async fn pdf_check_handler<E, I>(
    State(state): State<AppState<E, I>>,
    Json(request): Json<PdfCheckRequest>,
) -> Result<Json<PdfCheckResponse>, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let extraction_started = Instant::now();
    let extraction = fetch_and_extract(&state, &request.bucket, &request.object_path).await?;
    let extraction_time_ms = extraction_started.elapsed().as_millis() as u64;

    let options = request.options.unwrap_or_default();
    let mut verdict = state.detector.check(&extraction.text, &options).await?;

    attach_ai_analysis(&state, &options, &extraction.text, &mut verdict).await;

    Ok(Json(PdfCheckResponse {
        verdict,
        pdf_metrics: PdfMetrics {
            extraction_time_ms,
            total_pages: extraction.total_pages,
            discarded_segments: extraction.discarded_segments,
        },
    }))
}

async fn fetch_and_extract<E, I>(
    state: &AppState<E, I>,
    bucket: &str,
    object_path: &str,
) -> Result<veriscan::pdf::PdfExtraction, ApiError>
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    let Some(store) = &state.object_store else {
        return Err(ApiError::Unavailable(
            "object store is not configured".to_string(),
        ));
    };

    let bytes = store.fetch_object(bucket, object_path).await?;
    let extraction = veriscan::pdf::extract_text(&bytes)?;
    Ok(extraction)
}

fn default_title(object_path: &str) -> String {
    object_path
        .rsplit('/')
        .next()
        .unwrap_or(object_path)
        .trim_end_matches(".pdf")
        .replace(['_', '-'], " ")
}
