//! Combiner configuration.

use crate::record::REQUIRED_COLUMNS;
use std::path::PathBuf;

/// Default similarity threshold for duplicate detection
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Configuration for one combine run.
///
/// All knobs the pipeline reads live here so that multiple runs in one
/// process never share mutable state.
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// Directory scanned for input CSV files
    pub input_dir: PathBuf,
    /// Path of the final deduplicated CSV
    pub output_path: PathBuf,
    /// Titles scoring at or above this are duplicates (default 0.85)
    pub similarity_threshold: f64,
    /// The closed record schema; sources missing any of these get them
    /// backfilled with empty strings
    pub required_columns: Vec<String>,
}

impl CombineConfig {
    /// Build a config for the given input directory and output path with
    /// default threshold and schema.
    pub fn new(input_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    /// Override the similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input"),
            output_path: PathBuf::from("./output/papers.csv"),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}
