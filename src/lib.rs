//! # paperbase
//!
//! Academic paper metadata aggregator: fetches records from CrossRef,
//! arXiv and IEEE Xplore, combines the resulting CSV files into one unified
//! table, deduplicates near-identical entries by title similarity, and
//! renumbers the survivors.
//!
//! ## Modules
//!
//! - [`combine`] - CSV combination and deduplication pipeline
//! - [`ingest`] - directory ingestion and schema normalization
//! - [`dedup`] - pairwise duplicate detection (O(n²), a designed-in limit)
//! - [`similarity`] - token-Jaccard title scoring
//! - [`record`] - the closed twelve-field paper schema
//! - [`crossref`] / [`arxiv`] / [`ieee`] - source API clients
//! - [`error`] - custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paperbase::combine::Combiner;
//! use paperbase::config::CombineConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = CombineConfig::new("./input", "./output/papers.csv");
//!     let summary = Combiner::new(config).run()?;
//!     println!("{} rows in, {} out", summary.rows_in, summary.rows_out);
//!     Ok(())
//! }
//! ```

pub mod arxiv;
pub mod combine;
pub mod config;
pub mod crossref;
pub mod dedup;
pub mod error;
pub mod ieee;
pub mod ingest;
pub mod record;
pub mod similarity;

pub use error::{PaperbaseError, Result};
