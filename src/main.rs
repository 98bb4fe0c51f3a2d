//! paperbase - academic paper metadata aggregator.
//!
//! Fetches paper metadata from CrossRef, arXiv and IEEE Xplore into per-source
//! CSV files, combines and deduplicates them into one table, and exposes a
//! minimal HTTP endpoint for fetching single records.
//!
//! ## Usage
//!
//! ### Combine CSV files
//! ```bash
//! paperbase combine --input-dir ./input --output ./output/papers.csv
//! ```
//!
//! ### Fetch from a source
//! ```bash
//! paperbase fetch crossref "edge computing survey" --rows 50 --output-dir ./input
//! ```
//!
//! ### HTTP server mode
//! ```bash
//! paperbase serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use paperbase::{
    arxiv,
    combine::{write_csv, Combiner},
    config::{CombineConfig, DEFAULT_SIMILARITY_THRESHOLD},
    crossref::CrossrefClient,
    ieee::IeeeClient,
    record::{format_paper_id, PaperRecord},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Academic paper metadata aggregator
#[derive(Parser)]
#[command(name = "paperbase")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine and deduplicate all CSV files in a directory
    Combine {
        /// Directory scanned for input CSV files
        #[arg(long, default_value = "./input")]
        input_dir: PathBuf,

        /// Final deduplicated CSV path
        #[arg(short, long, default_value = "./output/papers.csv")]
        output: PathBuf,

        /// Title similarity threshold for duplicate detection
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,
    },

    /// Fetch paper metadata from a source into a CSV file
    Fetch {
        /// Metadata source
        #[arg(value_parser = ["crossref", "arxiv", "ieee"])]
        source: String,

        /// Search query
        query: String,

        /// Maximum records to fetch
        #[arg(long, default_value = "25")]
        rows: usize,

        /// API key (required for ieee)
        #[arg(long)]
        api_key: Option<String>,

        /// Backfill missing fields via batch CrossRef title lookup
        /// (arxiv and ieee sources only)
        #[arg(long)]
        enrich: bool,

        /// Directory the source CSV is written into
        #[arg(short, long, default_value = "./input")]
        output_dir: PathBuf,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (once, here - library code never touches the
    // global subscriber)
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Combine {
            input_dir,
            output,
            threshold,
        } => run_combine(input_dir, output, threshold),
        Commands::Fetch {
            source,
            query,
            rows,
            api_key,
            enrich,
            output_dir,
        } => run_fetch(source, query, rows, api_key, enrich, output_dir).await,
        Commands::Serve { port, host } => run_server(host, port).await,
    }
}

// ============================================================================
// Combine
// ============================================================================

fn run_combine(input_dir: PathBuf, output: PathBuf, threshold: f64) -> Result<()> {
    let config = CombineConfig::new(input_dir, output).with_threshold(threshold);
    let summary = Combiner::new(config).run().context("Combine failed")?;

    println!(
        "Combined {} rows, removed {} duplicates, wrote {} rows to {}",
        summary.rows_in,
        summary.duplicates_removed,
        summary.rows_out,
        summary.output_path.display()
    );
    Ok(())
}

// ============================================================================
// Fetch
// ============================================================================

async fn run_fetch(
    source: String,
    query: String,
    rows: usize,
    api_key: Option<String>,
    enrich: bool,
    output_dir: PathBuf,
) -> Result<()> {
    let mut records = match source.as_str() {
        "crossref" => CrossrefClient::new(3)?.search(&query, rows).await?,
        "arxiv" => arxiv::search(&query, rows).await?,
        "ieee" => {
            let key = api_key.context("--api-key is required for the ieee source")?;
            IeeeClient::new(key)?.search(&query, rows).await?
        }
        other => anyhow::bail!("Unknown source: {}", other),
    };

    if records.is_empty() {
        println!("No results from {} for {:?}.", source, query);
        return Ok(());
    }

    if enrich {
        if source == "crossref" {
            println!("--enrich ignored: crossref records are already CrossRef metadata.");
        } else {
            let enriched = enrich_via_crossref(&mut records).await?;
            println!("Enriched {} of {} records via CrossRef.", enriched, records.len());
        }
    }

    // Provisional per-source ids; the combine pass overwrites them.
    for (position, record) in records.iter_mut().enumerate() {
        record.paper_id = format_paper_id(position);
    }

    std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("{source}_{timestamp}.csv"));
    write_csv(&path, &records)?;

    println!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Batch-lookup titles on CrossRef (3 concurrent workers) and backfill
/// missing fields on each matching record in place.
///
/// Returns the number of records that got a CrossRef match.
async fn enrich_via_crossref(records: &mut [PaperRecord]) -> Result<usize> {
    let client = CrossrefClient::new(3)?;
    let titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
    let matches = client.lookup_batch(&titles).await;

    let mut enriched = 0;
    for (record, found) in records.iter_mut().zip(matches.iter()) {
        if let Some(metadata) = found {
            record.fill_missing_from(metadata);
            enriched += 1;
        }
    }
    Ok(enriched)
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState {
        crossref: CrossrefClient::new(3)?,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/papers", get(papers_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    crossref: CrossrefClient,
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Query parameters for `/papers`: one of `doi` or `title`
#[derive(Debug, Deserialize)]
struct PaperQuery {
    doi: Option<String>,
    title: Option<String>,
}

/// Fetch one paper record from CrossRef and return it schema-normalized.
async fn papers_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaperQuery>,
) -> std::result::Result<Json<PaperRecord>, (StatusCode, String)> {
    info!(doi = ?params.doi, title = ?params.title, "Paper request");

    let record = match (&params.doi, &params.title) {
        (Some(doi), _) => state.crossref.lookup_by_doi(doi).await.map_err(|e| {
            error!(error = %e, "DOI lookup failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?,
        (None, Some(title)) => state.crossref.lookup_by_title(title).await,
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Provide a doi or title query parameter".to_string(),
            ))
        }
    };

    match record {
        Some(record) => Ok(Json(enrich(record))),
        None => Err((StatusCode::NOT_FOUND, "No matching paper".to_string())),
    }
}

/// Light enrichment: derive a resolver URL from the DOI when the source
/// record has none.
fn enrich(mut record: PaperRecord) -> PaperRecord {
    if record.url.is_empty() && !record.doi.is_empty() {
        record.url = format!("https://doi.org/{}", record.doi);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_backfills_url_from_doi() {
        let record = PaperRecord {
            doi: "10.1234/test".to_string(),
            ..Default::default()
        };
        assert_eq!(enrich(record).url, "https://doi.org/10.1234/test");
    }

    #[test]
    fn test_enrich_keeps_existing_url() {
        let record = PaperRecord {
            doi: "10.1234/test".to_string(),
            url: "https://example.com/paper".to_string(),
            ..Default::default()
        };
        assert_eq!(enrich(record).url, "https://example.com/paper");
    }
}
