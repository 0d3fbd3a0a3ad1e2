//! Veriscan library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by module:
//!
//! ## Core Types (Stable)
//! - [`Config`], [`ConfigError`], [`ChunkingPreset`] - Service configuration
//! - [`Severity`] - Banded verdict labels
//! - [`Verdict`], [`ChunkAnalysis`], [`CheckOptions`] - Check results
//!
//! ## Pipeline
//! - [`TextChunker`], [`TextChunk`] - Normalisation and word windows
//! - [`OllamaEmbedder`], [`Embedder`] - Batched embedding generation
//! - [`QdrantIndex`], [`DocumentIndex`] - Vector store access
//! - [`Detector`] - The check orchestrator
//! - [`DocumentIngestor`] - Upload/batch ingestion
//!
//! ## Scoring
//! - [`lexical_similarity`], [`has_citation`] - Surface similarity and
//!   citation markers
//! - [`Match`] - Fused candidate matches
//!
//! ## Collaborators
//! - [`MinioClient`] - Object-store fetch for the PDF paths
//! - [`extract_pdf_text`] - PDF extraction with furniture filtering
//! - [`OllamaAnalyzer`], [`Analyzer`] - Optional AI commentary hook
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod analysis;
pub mod chunker;
pub mod config;
pub mod detector;
pub mod embedding;
pub mod ingest;
pub mod lexical;
pub mod matching;
pub mod objectstore;
pub mod pdf;
pub mod severity;
pub mod vectordb;

pub use analysis::{AiAnalysis, AnalysisError, Analyzer, OllamaAnalyzer, explanation_for};
pub use chunker::{TextChunk, TextChunker, detect_language};
pub use config::{ChunkingPreset, Config, ConfigError};
pub use detector::{CheckOptions, ChunkAnalysis, DetectError, Detector, ProcessingMetrics, Verdict};
pub use embedding::{Embedder, EmbeddingError, OllamaEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use ingest::{
    BatchItem, BatchReport, DocumentIngestor, IngestError, UploadOutcome, UploadRequest,
};
pub use lexical::{CITATION_PENALTY, has_citation, lexical_similarity};
pub use matching::{Match, SEMANTIC_WEIGHT};
pub use objectstore::{MinioClient, ObjectStoreError};
pub use pdf::{PdfError, PdfExtraction, extract_text as extract_pdf_text};
pub use severity::Severity;
pub use vectordb::{
    ChunkHit, ChunkRecord, DocumentIndex, DocumentPage, DocumentQuery, DocumentRecord, IndexError,
    KnnQuery, QdrantIndex, StoredDocument,
};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockIndex;
