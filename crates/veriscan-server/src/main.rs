//! Veriscan HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use veriscan::analysis::OllamaAnalyzer;
use veriscan::config::Config;
use veriscan::embedding::OllamaEmbedder;
use veriscan::objectstore::MinioClient;
use veriscan::vectordb::{DocumentIndex, QdrantIndex};
use veriscan_server::gateway::{AppState, create_router_with_state};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        index = %config.qdrant_index,
        "Veriscan starting"
    );

    let index = Arc::new(
        QdrantIndex::new(&config.qdrant_url, &config.qdrant_index, config.embedding_dims).await?,
    );
    index.ensure_schema().await?;
    tracing::info!(qdrant = %config.qdrant_url, "index schema ready");

    let embedder = Arc::new(OllamaEmbedder::from_config(&config)?);
    tracing::info!(
        ollama = %config.ollama_host,
        model = embedder.model(),
        dims = config.embedding_dims,
        "embedder configured"
    );

    let mut state = AppState::new(embedder, index, config.clone());

    state = state.with_analyzer(OllamaAnalyzer::from_config(&config)?);

    match MinioClient::from_config(&config)? {
        Some(minio) => {
            tracing::info!(endpoint = %config.minio_endpoint, "object store configured");
            state = state.with_object_store(minio);
        }
        None => {
            tracing::warn!("MinIO credentials not set, PDF routes disabled");
        }
    }

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Veriscan shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    rt.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .expect("failed to build client");

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
