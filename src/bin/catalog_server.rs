//! HTTP server binary entry point.
//!
//! Loads the catalog artifact and embedding model once, then serves
//! `POST /search` and `GET /hello`. Every flag can also be set through a
//! `CATALOG_SEARCH_*` environment variable.
//!
//! # Examples
//!
//! ```bash
//! catalog_server --catalog-path processed_data_with_embeddings.json --port 8000
//! CATALOG_SEARCH_CORS_ORIGINS=http://localhost:3000 catalog_server
//! ```

use anyhow::{Context, Result};
use catalog_search::{
    embedding::fastembed::DEFAULT_MODEL_NAME,
    extraction::FactorStrategy,
    query::{ScoringMode, DEFAULT_TOP_K},
    server::{build_query_service, start_server, AppState, ServerConfig},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Catalog search HTTP server
#[derive(Parser, Debug)]
#[command(name = "catalog_server", version, about = "Serve semantic catalog search over HTTP")]
struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "CATALOG_SEARCH_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "CATALOG_SEARCH_PORT", default_value_t = 8000)]
    port: u16,

    /// Allowed CORS origins, comma separated; "*" allows any origin
    #[arg(long, env = "CATALOG_SEARCH_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// Catalog artifact written by the ingestion binary
    #[arg(
        long,
        value_name = "FILE",
        env = "CATALOG_SEARCH_CATALOG_PATH",
        default_value = "processed_data_with_embeddings.json"
    )]
    catalog_path: PathBuf,

    /// Embedding model name
    #[arg(long, value_name = "MODEL", env = "CATALOG_SEARCH_EMBEDDING_MODEL", default_value = DEFAULT_MODEL_NAME)]
    embedding_model: String,

    /// FastEmbed model cache directory
    #[arg(long, value_name = "DIR", env = "CATALOG_SEARCH_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Seconds allowed for ranking a single request
    #[arg(long, value_name = "SECS", env = "CATALOG_SEARCH_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Maximum number of results per query
    #[arg(long, value_name = "N", env = "CATALOG_SEARCH_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// column-embeddings or stored-embeddings
    #[arg(long, env = "CATALOG_SEARCH_SCORING_MODE", default_value_t = ScoringMode::default())]
    scoring_mode: ScoringMode,

    /// last-match-wins or first-match-wins
    #[arg(long, env = "CATALOG_SEARCH_FACTOR_STRATEGY", default_value_t = FactorStrategy::default())]
    factor_strategy: FactorStrategy,

    /// JSON gazetteer extending the built-in entity phrases
    #[arg(long, value_name = "FILE", env = "CATALOG_SEARCH_GAZETTEER_PATH")]
    gazetteer_path: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", env = "CATALOG_SEARCH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            cors_origins: args.cors_origins,
            embedding_model: args.embedding_model,
            cache_dir: args.cache_dir,
            catalog_path: args.catalog_path,
            request_timeout_secs: args.request_timeout_secs,
            top_k: args.top_k,
            scoring_mode: args.scoring_mode,
            factor_strategy: args.factor_strategy,
            gazetteer_path: args.gazetteer_path,
        }
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_logging(&args.log_level);

    let config = ServerConfig::from(args);
    info!("Starting catalog search server");

    let service = build_query_service(&config).await.with_context(|| {
        format!(
            "Failed to initialize search service from {}. Run the ingestion binary first to build the catalog.",
            config.catalog_path.display()
        )
    })?;

    start_server(&config, AppState::new(service))
        .await
        .context("Server error")
}
