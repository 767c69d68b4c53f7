//! Search binary entry point.
//!
//! This binary provides a command-line interface for searching a catalog
//! artifact without running the HTTP server. It supports both single-query and
//! interactive REPL modes, with table or JSON output.
//!
//! # Examples
//!
//! Single query:
//! ```bash
//! search --query "covid-19 datasets in france"
//! ```
//!
//! JSON output against a specific artifact:
//! ```bash
//! search --catalog-path catalog.json --query "oncology claims" --format json
//! ```
//!
//! Interactive mode:
//! ```bash
//! search --interactive
//! ```

use anyhow::{Context, Result};
use catalog_search::{
    embedding::{fastembed::DEFAULT_MODEL_NAME, normalize_query},
    extraction::{FactorExtractor, FactorStrategy},
    models::ScoredRecord,
    query::{ScoringMode, DEFAULT_TOP_K},
    server::{build_extractor, build_query_service, types::SearchResultDto, ServerConfig},
    service::{QueryService, SearchOutcome},
};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for search results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table with color-coded penalties
    Table,
    /// Machine-readable JSON, same shape as the HTTP API
    Json,
}

/// Search binary CLI for querying the catalog
#[derive(Parser, Debug)]
#[command(
    name = "search",
    version,
    about = "Search the dataset catalog using semantic similarity",
    long_about = "Query the catalog artifact using semantic search. Supports both single-query \
                  and interactive modes with flexible output formatting.

EXAMPLES:
  Single query:
    search --query \"covid-19 datasets in france\"

  JSON output:
    search --query \"oncology claims\" --format json

  Interactive mode:
    search --interactive

  Rank against stored record embeddings:
    search --query \"EHR in japan\" --scoring-mode stored-embeddings"
)]
struct Args {
    /// Catalog artifact written by the ingestion binary
    #[arg(
        long,
        value_name = "FILE",
        env = "CATALOG_SEARCH_CATALOG_PATH",
        default_value = "processed_data_with_embeddings.json"
    )]
    catalog_path: PathBuf,

    /// Search query (required for single-query mode, omitted in interactive mode)
    #[arg(long, value_name = "TEXT", conflicts_with = "interactive")]
    query: Option<String>,

    /// Number of results to return
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

    /// Embedding model name
    #[arg(long, value_name = "MODEL", env = "CATALOG_SEARCH_EMBEDDING_MODEL", default_value = DEFAULT_MODEL_NAME)]
    embedding_model: String,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,

    /// FastEmbed model cache directory
    #[arg(long, value_name = "DIR", env = "CATALOG_SEARCH_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            catalog_path: self.catalog_path.clone(),
            embedding_model: self.embedding_model.clone(),
            cache_dir: self.cache_dir.clone(),
            top_k: self.top_k,
            scoring_mode: self.scoring_mode,
            factor_strategy: self.factor_strategy,
            gazetteer_path: self.gazetteer_path.clone(),
            ..Default::default()
        }
    }
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

/// Execute a search query and return the ranked records
async fn execute_search(service: &QueryService, query_text: &str) -> Result<Vec<ScoredRecord>> {
    debug!("Executing search for query: {}", query_text);

    let outcome = service
        .search(Some(query_text))
        .await
        .with_context(|| format!("Failed to execute search for query: '{}'", query_text))?;

    Ok(match outcome {
        SearchOutcome::Results(results) => results,
        SearchOutcome::NoResults => Vec::new(),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Format results as a pretty table
fn format_results_table(results: &[ScoredRecord]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Dataset").add_attribute(Attribute::Bold),
        Cell::new("Geography").add_attribute(Attribute::Bold),
        Cell::new("Category").add_attribute(Attribute::Bold),
        Cell::new("Similarity").add_attribute(Attribute::Bold),
        Cell::new("Penalty").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
    ]);

    for (idx, result) in results.iter().enumerate() {
        let record = &result.record;
        let penalty_color = if result.penalty > 0.0 { Color::Yellow } else { Color::Green };

        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(truncate(record.dataset_name.as_deref().unwrap_or("-"), 50)),
            Cell::new(truncate(record.geographic_coverage.as_deref().unwrap_or("-"), 30)),
            Cell::new(truncate(record.dataset_category.as_deref().unwrap_or("-"), 25)),
            Cell::new(format!("{:.4}", result.similarity)),
            Cell::new(format!("{:.1}", result.penalty)).fg(penalty_color),
            Cell::new(format!("{:.4}", result.penalized_similarity)),
        ]);
    }

    table.to_string()
}

/// Format results as JSON, in the HTTP response shape
fn format_results_json(results: &[ScoredRecord]) -> Result<String> {
    let dtos: Vec<SearchResultDto> = results.iter().cloned().map(SearchResultDto::from).collect();
    serde_json::to_string_pretty(&dtos).with_context(|| "Failed to serialize results to JSON")
}

/// Display detailed view of a single result
fn display_result_detail(result: &ScoredRecord, rank: usize) {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let record = &result.record;

    println!("\n{}", "═".repeat(80));
    println!("Rank: {}", rank);
    println!("Dataset: {}", field(&record.dataset_name));
    println!("Type: {}", field(&record.dataset_type));
    println!("Vendor: {}", field(&record.vendor_name));
    println!("Country / Region: {} / {}", field(&record.country), field(&record.region));
    println!("Geographic coverage: {}", field(&record.geographic_coverage));
    println!("Therapeutic coverage: {}", field(&record.thematic_coverage));
    println!("TA coverage: {}", field(&record.ta_coverage));
    println!("Category: {}", field(&record.dataset_category));
    println!(
        "Similarity: {:.4}  Penalty: {:.1}  Score: {:.4}",
        result.similarity, result.penalty, result.penalized_similarity
    );
    println!("\nDescription:\n{}", field(&record.description));
    println!("{}", "═".repeat(80));
}

fn print_results(results: &[ScoredRecord], format: OutputFormat, elapsed: std::time::Duration) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", format_results_table(results));
            println!("\nFound {} results in {:.2}s", results.len(), elapsed.as_secs_f64());
        }
        OutputFormat::Json => println!("{}", format_results_json(results)?),
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <query>         - Search the catalog");
    println!("  /factors <text> - Show the factors extracted from a query");
    println!("  /format table   - Use table output format");
    println!("  /format json    - Use JSON output format");
    println!("  /detail N       - Show full details for result rank N");
    println!("  /help           - Show this help");
    println!("  Ctrl+D or Ctrl+C - Exit");
}

/// Run interactive REPL mode
async fn run_interactive(
    service: QueryService,
    extractor: FactorExtractor,
    mut format: OutputFormat,
) -> Result<()> {
    println!("Interactive Catalog Search ({} records)", service.catalog().len());
    print_help();
    println!();

    let mut rl = DefaultEditor::new().with_context(|| "Failed to create readline editor")?;
    let mut last_results: Vec<ScoredRecord> = Vec::new();

    loop {
        match rl.readline("Search> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok();

                if let Some(command) = line.strip_prefix('/') {
                    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
                    let rest = rest.trim();
                    match name {
                        "help" => print_help(),
                        "factors" => {
                            let factors = extractor.extract(&normalize_query(rest));
                            println!("  geographic:   {}", factors.geographic.as_deref().unwrap_or("-"));
                            println!("  thematic:     {}", factors.thematic.as_deref().unwrap_or("-"));
                            println!("  dataset hint: {}", factors.dataset_hint);
                        }
                        "format" => match rest {
                            "table" => {
                                format = OutputFormat::Table;
                                println!("Set output format to table");
                            }
                            "json" => {
                                format = OutputFormat::Json;
                                println!("Set output format to JSON");
                            }
                            _ => eprintln!("Usage: /format [table|json]"),
                        },
                        "detail" => match rest.parse::<usize>() {
                            Ok(rank) if rank > 0 && rank <= last_results.len() => {
                                display_result_detail(&last_results[rank - 1], rank);
                            }
                            Ok(rank) if rank > last_results.len() => {
                                eprintln!(
                                    "Rank {} out of range (last search had {} results)",
                                    rank,
                                    last_results.len()
                                );
                            }
                            _ => eprintln!("Usage: /detail N"),
                        },
                        _ => eprintln!("Unknown command: /{}. Type /help for available commands.", name),
                    }
                    continue;
                }

                let start = Instant::now();
                match execute_search(&service, line).await {
                    Ok(results) => {
                        if let Err(e) = print_results(&results, format, start.elapsed()) {
                            eprintln!("Error formatting results: {}", e);
                        }
                        last_results = results;
                    }
                    Err(e) => eprintln!("Search failed: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    if !args.catalog_path.exists() {
        anyhow::bail!(
            "Catalog artifact not found: {}\n\
             Please run the ingestion binary first to build it.",
            args.catalog_path.display()
        );
    }

    let config = args.server_config();
    let service = build_query_service(&config)
        .await
        .with_context(|| "Failed to initialize search service")?;

    if service.catalog().is_empty() {
        anyhow::bail!("Catalog is empty (0 usable records in {})", args.catalog_path.display());
    }

    match (args.interactive, args.query.as_deref()) {
        (true, _) => {
            let extractor = build_extractor(&config)?;
            run_interactive(service, extractor, args.format).await
        }
        (false, Some(query)) => {
            let start = Instant::now();
            let results = execute_search(&service, query).await?;
            print_results(&results, args.format, start.elapsed())
        }
        (false, None) => anyhow::bail!(
            "Either --query or --interactive must be specified.\n\
             Use --help for usage information."
        ),
    }
}
