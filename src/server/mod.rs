//! HTTP server module.
//!
//! Exposes the query service over HTTP with axum:
//!
//! - `POST /search` runs a catalog search
//! - `GET /hello` is a liveness probe
//!
//! Startup wiring (catalog load, model load, engine construction) lives here
//! too, so the server and CLI binaries build the exact same service.

pub mod handlers;
pub mod routing;
pub mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError, JsonCatalogSource};
use crate::embedding::fastembed::{default_cache_dir, FastEmbedProvider, DEFAULT_MODEL_NAME};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::extraction::{ExtractionError, FactorExtractor, FactorStrategy, GazetteerRecognizer};
use crate::query::{RankingEngine, ScoringMode, DEFAULT_TOP_K};
use crate::service::QueryService;

pub use routing::create_router;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The catalog artifact could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The embedding model could not be loaded
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The gazetteer could not be loaded
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to bind or serve
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Service and network configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Allowed CORS origins; `"*"` allows any origin
    pub cors_origins: Vec<String>,

    /// Embedding model identifier
    pub embedding_model: String,

    /// FastEmbed model cache directory
    pub cache_dir: Option<PathBuf>,

    /// Catalog artifact written by the ingestion binary
    pub catalog_path: PathBuf,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum number of results per query
    pub top_k: usize,

    pub scoring_mode: ScoringMode,

    pub factor_strategy: FactorStrategy,

    /// Optional JSON gazetteer layered over the built-in phrase list
    pub gazetteer_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            embedding_model: DEFAULT_MODEL_NAME.to_string(),
            cache_dir: None,
            catalog_path: PathBuf::from("processed_data_with_embeddings.json"),
            request_timeout_secs: 30,
            top_k: DEFAULT_TOP_K,
            scoring_mode: ScoringMode::default(),
            factor_strategy: FactorStrategy::default(),
            gazetteer_path: None,
        }
    }
}

impl ServerConfig {
    /// Socket address built from host and port.
    pub fn addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid address {}:{}: {}", self.host, self.port, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> ServerResult<()> {
        if self.top_k == 0 {
            return Err(ServerError::Config("top_k must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ServerError::Config("request_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

impl AppState {
    pub fn new(service: QueryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build a factor extractor from configuration.
pub fn build_extractor(config: &ServerConfig) -> ServerResult<FactorExtractor> {
    let recognizer = match &config.gazetteer_path {
        Some(path) => {
            let recognizer = GazetteerRecognizer::from_file(path, true)?;
            info!("Loaded gazetteer from {} ({} phrases)", path.display(), recognizer.len());
            recognizer
        }
        None => GazetteerRecognizer::default(),
    };
    Ok(FactorExtractor::new(recognizer, config.factor_strategy))
}

/// Load the catalog and model, and assemble the query service.
pub async fn build_query_service(config: &ServerConfig) -> ServerResult<QueryService> {
    config.validate()?;

    let source = JsonCatalogSource::from_file(&config.catalog_path).await?;
    let (catalog, _) = Catalog::load(&source).await?;

    info!("Loading embedding model {}", config.embedding_model);
    let cache_dir = config.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let provider = FastEmbedProvider::new(Some(&config.embedding_model), Some(cache_dir))?;

    // Stored vectors are only compared against in stored-embeddings mode
    if let Err(e) = catalog.ensure_compatible(provider.model_name(), provider.dimension()) {
        match config.scoring_mode {
            ScoringMode::StoredEmbeddings => return Err(e.into()),
            ScoringMode::ColumnEmbeddings => warn!("{}", e),
        }
    }

    let engine = RankingEngine::new(provider)
        .with_scoring_mode(config.scoring_mode)
        .with_top_k(config.top_k);
    let extractor = build_extractor(config)?;

    info!(
        "Query service ready: {} records, scoring mode {}, factor strategy {}",
        catalog.len(),
        config.scoring_mode,
        config.factor_strategy
    );

    Ok(QueryService::new(catalog, extractor, engine).with_request_timeout(config.request_timeout()))
}

/// Bind the configured address and serve until shutdown.
pub async fn start_server(config: &ServerConfig, state: AppState) -> ServerResult<()> {
    let addr = config.addr()?;
    let app = create_router(state, &config.cors_origins);

    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
