//! Qdrant-backed document index: document records, chunk vectors, kNN.

pub mod client;
pub mod error;
pub mod model;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use client::{DocumentIndex, QdrantIndex};
pub use error::IndexError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockIndex, cosine_similarity};
pub use model::{
    ChunkHit, ChunkRecord, DocumentPage, DocumentQuery, DocumentRecord, KnnQuery, StoredDocument,
    cap_per_source, point_id_for, postprocess_hits,
};

/// Default base collection name; chunk points live in `<name>_chunks`.
pub const DEFAULT_INDEX_NAME: &str = "plagiarism_documents";
