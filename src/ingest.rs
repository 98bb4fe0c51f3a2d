//! Ingestion normalizer.
//!
//! Reads every CSV file in an input directory, coerces each to the closed
//! twelve-field schema and concatenates the rows into one unified table.
//! Per-file parse failures are isolated: the file contributes nothing and
//! the run continues. A missing input directory is fatal.

use crate::config::CombineConfig;
use crate::error::{PaperbaseError, Result};
use crate::record::PaperRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load and normalize every CSV file under `config.input_dir` into the
/// unified table.
///
/// Files are processed in filename order so the table order (and therefore
/// which duplicate is later treated as canonical) does not depend on
/// filesystem listing order. No deduplication or renumbering happens here.
pub fn load_directory(config: &CombineConfig) -> Result<Vec<PaperRecord>> {
    let files = discover_csv_files(&config.input_dir)?;
    info!(
        dir = %config.input_dir.display(),
        files = files.len(),
        "Scanning input directory"
    );

    let mut unified = Vec::new();
    for path in &files {
        match load_file(path, &config.required_columns) {
            Ok(rows) => {
                info!(file = %path.display(), rows = rows.len(), "Loaded input file");
                unified.extend(rows);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unparseable input file");
            }
        }
    }

    info!(total_rows = unified.len(), "Unified table assembled");
    Ok(unified)
}

/// List the `.csv` entries of `dir`, sorted by filename.
fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| PaperbaseError::Filesystem {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Parse one CSV file into schema-normalized records.
///
/// Any read or parse error discards the whole file's contribution so a
/// half-parsed file cannot leak partial rows into the unified table.
fn load_file(path: &Path, required_columns: &[String]) -> Result<Vec<PaperRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let missing: Vec<&String> = required_columns
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        warn!(
            file = %path.display(),
            missing = ?missing,
            "Schema gap: backfilling missing columns with empty strings"
        );
    }
    let extra: Vec<&String> = headers
        .iter()
        .filter(|h| h.as_str() != "paper_id" && !required_columns.iter().any(|c| c == *h))
        .collect();
    if !extra.is_empty() {
        debug!(file = %path.display(), dropped = ?extra, "Dropping unknown columns");
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(PaperRecord::from_row(&row));
    }
    Ok(rows)
}
