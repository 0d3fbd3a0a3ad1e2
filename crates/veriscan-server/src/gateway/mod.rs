//! HTTP gateway (Axum) over the detection engine.
//!
//! The transport stays thin: request/response DTOs live in [`payload`],
//! all semantics live in the `veriscan` library crate.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use veriscan::embedding::Embedder;
use veriscan::vectordb::DocumentIndex;

pub use error::ApiError;
pub use state::AppState;

pub fn create_router_with_state<E, I>(state: AppState<E, I>) -> Router
where
    E: Embedder + 'static,
    I: DocumentIndex + 'static,
{
    Router::new()
        .route("/healthz", get(handler::health_handler))
        .route("/v1/check", post(handler::check_handler))
        .route("/v1/documents", post(handler::upload_handler))
        .route("/v1/documents", get(handler::search_documents_handler))
        .route("/v1/documents/batch", post(handler::batch_upload_handler))
        .route("/v1/documents/{id}", get(handler::get_document_handler))
        .route("/v1/documents/{id}", delete(handler::delete_document_handler))
        .route("/v1/pdf/index", post(handler::pdf_index_handler))
        .route("/v1/pdf/check", post(handler::pdf_check_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
