use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

use application::services::{EmbeddingEngine, ServiceConfig, VectorStore};
use application::AnswerService;
#[cfg(feature = "fastembed-engine")]
use infrastructure::FastEmbedEngine;
use infrastructure::{build_generator, SimpleEmbedEngine, SledVectorStore};
use interfaces::AppState;
use settings::{AppConfig, EmbeddingBackend};

/// Variable holding the `tracing` filter directive, e.g. `askdocs=debug`.
pub const LOG_FILTER_ENV: &str = "ASKDOCS_LOG";

/// Everything the HTTP layer needs, built once at startup.
pub struct AppHandles {
    pub service: Arc<AnswerService>,
    pub store: Arc<dyn VectorStore>,
    pub config: Arc<AppConfig>,
}

/// Entry point invoked from `main.rs`.
pub async fn run_service() -> Result<()> {
    // .env must be applied before the subscriber reads its filter
    let dotenv = load_dotenv();
    init_tracing();
    match dotenv? {
        Some(path) => info!("loaded environment from {}", path.display()),
        None => warn!("no .env file found; relying on process environment"),
    }

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        "Starting askdocs v{} (model: {}, index: {})",
        env!("CARGO_PKG_VERSION"),
        config.model.kind,
        config.persist_directory.display()
    );

    let bind_addr = config.server.bind_addr();
    let handles = tokio::task::spawn_blocking(move || build_environment(config))
        .await
        .context("initialisation task panicked")??;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("askdocs listening on http://{}", bind_addr);
    info!("ask with: POST http://{}/question?question=...", bind_addr);

    interfaces::serve(listener, AppState::new(handles.service), shutdown_signal())
        .await
        .context("server failed")?;

    info!("askdocs stopped");
    Ok(())
}

/// Construct the embedder, index, model backend and answer service.
pub fn build_environment(config: AppConfig) -> Result<AppHandles> {
    let backend = config
        .embedding_backend()
        .map_err(|err| anyhow!(err))
        .context("failed to resolve embedding backend")?;
    let embedder = init_embedder(&backend).context("failed to initialise embedding backend")?;

    let store_impl = SledVectorStore::open(&config.persist_directory)
        .map_err(|err| anyhow!(err))
        .context("failed to open vector index")?;
    let store: Arc<dyn VectorStore> = Arc::new(store_impl);

    let generator = build_generator(&config.model)
        .map_err(|err| anyhow!(err))
        .context("failed to construct language model backend")?;

    let service = Arc::new(AnswerService::new(
        embedder,
        Arc::clone(&store),
        generator,
        ServiceConfig::new(config.target_source_chunks),
    ));

    Ok(AppHandles {
        service,
        store,
        config: Arc::new(config),
    })
}

fn init_embedder(backend: &EmbeddingBackend) -> Result<Arc<dyn EmbeddingEngine>> {
    let engine: Arc<dyn EmbeddingEngine> = match backend {
        EmbeddingBackend::Simple { model, dimensions } => Arc::new(
            SimpleEmbedEngine::try_new(model.clone(), *dimensions)
                .map_err(|err| anyhow!(err))?,
        ),
        #[cfg(feature = "fastembed-engine")]
        EmbeddingBackend::FastEmbed { model } => {
            Arc::new(FastEmbedEngine::try_new(model).map_err(|err| anyhow!(err))?)
        }
    };

    info!(
        target: "askdocs::embeddings",
        backend = backend.id(),
        model = engine.model_name(),
        dims = engine.dims(),
        "embedding engine ready"
    );
    Ok(engine)
}

/// Applies `.env` to the process environment. `None` when there is no file.
fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(anyhow!(err)).context("failed to read .env file"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub fn init_tracing() {
    init_tracing_with_writer(std::io::stderr);
}

fn init_tracing_with_writer<W>(make_writer: fn() -> W)
where
    W: std::io::Write + Send + Sync + 'static,
{
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(log_filter())
            .with_target(true)
            .with_writer(make_writer)
            .compact()
            .try_init();
    });
}

fn log_filter() -> String {
    resolve_log_filter(std::env::var(LOG_FILTER_ENV).ok())
}

fn resolve_log_filter(value: Option<String>) -> String {
    value
        .map(|directive| directive.trim().to_string())
        .filter(|directive| !directive.is_empty())
        .unwrap_or_else(|| "info".to_string())
}
