//! Ingestion pipeline binary entry point.
//!
//! This binary builds the catalog artifact the search service loads: it reads a
//! JSON export of the raw catalog, drops incomplete rows, embeds the descriptive
//! columns and writes records, vectors and embedding config as JSON.
//!
//! # Examples
//!
//! Build with defaults:
//! ```bash
//! ingestion --input genai_data.json
//! ```
//!
//! Custom output and batch size:
//! ```bash
//! ingestion --input genai_data.json --output catalog.json --batch-size 50
//! ```

use anyhow::{Context, Result};
use catalog_search::{
    catalog::json::write_artifact,
    embedding::{
        fastembed::{default_cache_dir, FastEmbedProvider, DEFAULT_MODEL_NAME},
        EmbeddingProvider,
    },
    ingestion::{CatalogBuilder, DEFAULT_BATCH_SIZE},
    source::{JsonRowSource, RowSource},
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Ingestion pipeline CLI for building the catalog artifact
#[derive(Parser, Debug)]
#[command(
    name = "ingestion",
    version,
    about = "Build the catalog artifact used by the search service",
    long_about = "Offline pipeline that embeds catalog rows and writes the JSON artifact loaded by catalog_server and search.

EXAMPLES:
  Build with defaults:
    ingestion --input genai_data.json

  Custom output and batch size:
    ingestion --input genai_data.json --output catalog.json --batch-size 50

  Different model:
    ingestion --input genai_data.json --embedding-model bge-small-en-v1.5"
)]
struct IngestionArgs {
    /// Input JSON export: an array of objects keyed by column header
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output artifact path
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "processed_data_with_embeddings.json"
    )]
    output: PathBuf,

    /// Embedding model name
    #[arg(long, value_name = "MODEL", env = "CATALOG_SEARCH_EMBEDDING_MODEL", default_value = DEFAULT_MODEL_NAME)]
    embedding_model: String,

    /// Number of rows to embed per batch
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Only process the first N rows
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", env = "CATALOG_SEARCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// FastEmbed model cache directory
    #[arg(long, value_name = "DIR", env = "CATALOG_SEARCH_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

/// Initialize logging subsystem with the specified level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Create a progress bar for tracking embedded rows
fn create_progress_bar(total: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows embedded")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = IngestionArgs::parse();
    init_logging(&args.log_level);

    info!("Starting catalog ingestion pipeline");
    debug!("CLI arguments: {:?}", args);

    let start_time = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let source = JsonRowSource::from_file(&args.input)
        .await
        .with_context(|| format!("Failed to load rows from {}", args.input.display()))?;

    let rows = match args.limit {
        Some(limit) => source.fetch_rows_limit(limit).await?,
        None => source.fetch_rows().await?,
    };
    info!("Found {} rows in {}", rows.len(), source.name());

    if rows.is_empty() {
        warn!("No rows found in input file");
        return Ok(());
    }

    let cache_dir = args.cache_dir.clone().unwrap_or_else(default_cache_dir);
    debug!("Using model cache directory: {}", cache_dir.display());
    let provider = FastEmbedProvider::new(Some(&args.embedding_model), Some(cache_dir))
        .context("Failed to initialize FastEmbed provider")?;
    info!(
        "FastEmbed provider initialized: model={}, dimension={}",
        provider.model_name(),
        provider.dimension()
    );

    let builder = CatalogBuilder::new(provider, Some(args.batch_size));

    // Incomplete rows never reach the progress bar
    let progress = create_progress_bar(rows.iter().filter(|r| r.is_complete()).count())?;
    let (artifact, stats) = builder
        .build_with_progress(rows, |n| progress.inc(n as u64))
        .await
        .context("Failed to build catalog")?;
    progress.finish();

    write_artifact(&args.output, &artifact)
        .await
        .with_context(|| format!("Failed to write artifact to {}", args.output.display()))?;

    let elapsed = start_time.elapsed();
    println!("\n╔════════════════════════════════════════╗");
    println!("║      Ingestion Completed               ║");
    println!("╠════════════════════════════════════════╣");
    println!("║ Total rows:           {:>16} ║", stats.total_rows);
    println!("║ Kept:                 {:>16} ║", stats.kept);
    println!("║ Dropped (incomplete): {:>16} ║", stats.dropped_incomplete);
    println!("║ Batches:              {:>16} ║", stats.batches);
    println!("║ Elapsed time:         {:>13.2?} ║", elapsed);
    println!("╚════════════════════════════════════════╝");

    if stats.dropped_incomplete > 0 {
        warn!(
            "{} rows lacked a description or TA coverage and were dropped",
            stats.dropped_incomplete
        );
    }

    info!("Wrote {}", args.output.display());
    Ok(())
}
