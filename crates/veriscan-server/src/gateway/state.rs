use std::sync::Arc;

use veriscan::analysis::OllamaAnalyzer;
use veriscan::config::Config;
use veriscan::detector::Detector;
use veriscan::embedding::Embedder;
use veriscan::ingest::DocumentIngestor;
use veriscan::objectstore::MinioClient;
use veriscan::vectordb::DocumentIndex;

/// Shared handler state: one set of clients serves every request.
pub struct AppState<E: Embedder + 'static, I: DocumentIndex + 'static> {
    pub detector: Arc<Detector<E, I>>,
    pub ingestor: Arc<DocumentIngestor<E, I>>,
    pub embedder: Arc<E>,
    pub index: Arc<I>,

    /// Optional AI commentary hook.
    pub analyzer: Option<Arc<OllamaAnalyzer>>,

    /// Optional object-store client; absent disables the PDF routes.
    pub object_store: Option<Arc<MinioClient>>,

    pub config: Config,
}

impl<E: Embedder, I: DocumentIndex> AppState<E, I> {
    pub fn new(embedder: Arc<E>, index: Arc<I>, config: Config) -> Self {
        let detector = Arc::new(Detector::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            config.clone(),
        ));
        let ingestor = Arc::new(DocumentIngestor::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            config.clone(),
        ));

        Self {
            detector,
            ingestor,
            embedder,
            index,
            analyzer: None,
            object_store: None,
            config,
        }
    }

    pub fn with_analyzer(mut self, analyzer: OllamaAnalyzer) -> Self {
        self.analyzer = Some(Arc::new(analyzer));
        self
    }

    pub fn with_object_store(mut self, object_store: MinioClient) -> Self {
        self.object_store = Some(Arc::new(object_store));
        self
    }
}

impl<E: Embedder, I: DocumentIndex> Clone for AppState<E, I> {
    fn clone(&self) -> Self {
        Self {
            detector: Arc::clone(&self.detector),
            ingestor: Arc::clone(&self.ingestor),
            embedder: Arc::clone(&self.embedder),
            index: Arc::clone(&self.index),
            analyzer: self.analyzer.clone(),
            object_store: self.object_store.clone(),
            config: self.config.clone(),
        }
    }
}
