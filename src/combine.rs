//! CSV combination and deduplication pipeline.
//!
//! Runs the three sequential stages over one input directory: ingest and
//! normalize every CSV into the unified table, detect duplicate titles, then
//! drop the duplicates, renumber the survivors and persist both snapshots.
//! Fully single-threaded; the unified table is owned exclusively by the
//! running pipeline for the duration of one invocation.

use crate::config::CombineConfig;
use crate::dedup::{duplicate_indices, find_duplicates};
use crate::error::{PaperbaseError, Result};
use crate::ingest::load_directory;
use crate::record::{format_paper_id, PaperRecord, REQUIRED_COLUMNS};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Counts and artifact paths from one combine run.
#[derive(Debug, Clone)]
pub struct CombineSummary {
    /// Rows in the unified table before deduplication
    pub rows_in: usize,
    /// Rows dropped as duplicates
    pub duplicates_removed: usize,
    /// Rows in the final table
    pub rows_out: usize,
    /// Timestamped pre-final snapshot
    pub intermediate_path: PathBuf,
    /// Final deduplicated CSV
    pub output_path: PathBuf,
}

/// The combine pipeline.
pub struct Combiner {
    config: CombineConfig,
}

impl Combiner {
    pub fn new(config: CombineConfig) -> Self {
        Self { config }
    }

    /// Run ingest, duplicate detection and reduction, writing the
    /// intermediate and final snapshots.
    ///
    /// Renumbering happens before the intermediate snapshot is written, so
    /// the ids in the intermediate artifact match the final artifact.
    pub fn run(&self) -> Result<CombineSummary> {
        let unified = load_directory(&self.config)?;
        let rows_in = unified.len();

        let duplicates = find_duplicates(&unified, self.config.similarity_threshold);
        let drop_set = duplicate_indices(&duplicates);
        let duplicates_removed = drop_set.len();

        let mut survivors: Vec<PaperRecord> = unified
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !drop_set.contains(idx))
            .map(|(_, record)| record)
            .collect();

        for (position, record) in survivors.iter_mut().enumerate() {
            record.paper_id = format_paper_id(position);
        }

        let intermediate_path = self.intermediate_path()?;
        write_csv(&intermediate_path, &survivors)?;
        info!(
            path = %intermediate_path.display(),
            rows = survivors.len(),
            "Wrote intermediate snapshot"
        );

        write_csv(&self.config.output_path, &survivors)?;
        info!(
            path = %self.config.output_path.display(),
            rows_in = rows_in,
            duplicates = duplicates_removed,
            rows_out = survivors.len(),
            "Wrote final deduplicated table"
        );

        Ok(CombineSummary {
            rows_in,
            duplicates_removed,
            rows_out: survivors.len(),
            intermediate_path,
            output_path: self.config.output_path.clone(),
        })
    }

    /// `<output_stem>_deduplicated_<YYYYMMDD_HHMMSS>.csv` next to the final
    /// output file.
    fn intermediate_path(&self) -> Result<PathBuf> {
        let stem = self
            .config
            .output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                PaperbaseError::Config(format!(
                    "Output path has no file name: {}",
                    self.config.output_path.display()
                ))
            })?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let file_name = format!("{stem}_deduplicated_{timestamp}.csv");
        Ok(match self.config.output_path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        })
    }
}

/// Serialize the full table to `path` as CSV, `paper_id` column first.
///
/// Single-file all-or-nothing write; a missing or unwritable parent
/// directory fails the run.
pub fn write_csv(path: &Path, records: &[PaperRecord]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| PaperbaseError::Filesystem {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    if records.is_empty() {
        // serialize() only emits the header alongside a first row.
        let header = std::iter::once("paper_id").chain(REQUIRED_COLUMNS.iter().copied());
        writer.write_record(header)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).expect("create file");
        f.write_all(content.as_bytes()).expect("write file");
    }

    fn read_records(path: &Path) -> Vec<PaperRecord> {
        let mut reader = csv::Reader::from_path(path).expect("open output");
        reader
            .deserialize()
            .collect::<std::result::Result<Vec<PaperRecord>, _>>()
            .expect("parse output")
    }

    #[test]
    fn test_end_to_end_two_files() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir(&input).expect("mkdir");
        write_file(&input, "a.csv", "paper_id,title\nx,Edge Computing Survey\n");
        write_file(
            &input,
            "b.csv",
            "title\nedge computing survey.\nQuantum Networking\n",
        );
        let output = dir.path().join("final.csv");

        let summary = Combiner::new(CombineConfig::new(&input, &output))
            .run()
            .expect("combine");

        assert_eq!(summary.rows_in, 3);
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.rows_out, 2);

        let records = read_records(&output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].paper_id, "paper_001");
        assert_eq!(records[0].title, "Edge Computing Survey");
        assert_eq!(records[1].paper_id, "paper_002");
        assert_eq!(records[1].title, "Quantum Networking");
    }

    #[test]
    fn test_renumbering_is_dense_and_ordered() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir(&input).expect("mkdir");
        write_file(
            &input,
            "a.csv",
            "paper_id,title\nz9,Title One\n,Title Two\nq,Title Three\n,Title Four\n,Title Five\n",
        );
        let output = dir.path().join("final.csv");

        Combiner::new(CombineConfig::new(&input, &output))
            .run()
            .expect("combine");

        let ids: Vec<String> = read_records(&output).into_iter().map(|r| r.paper_id).collect();
        assert_eq!(
            ids,
            vec!["paper_001", "paper_002", "paper_003", "paper_004", "paper_005"]
        );
    }

    #[test]
    fn test_intermediate_snapshot_ids_match_final() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir(&input).expect("mkdir");
        write_file(&input, "a.csv", "title\nEdge Computing Survey\nQuantum Networking\n");
        let output = dir.path().join("final.csv");

        let summary = Combiner::new(CombineConfig::new(&input, &output))
            .run()
            .expect("combine");

        let name = summary
            .intermediate_path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("intermediate name");
        assert!(name.starts_with("final_deduplicated_"));
        assert!(name.ends_with(".csv"));

        let intermediate = read_records(&summary.intermediate_path);
        let final_table = read_records(&output);
        assert_eq!(intermediate, final_table);
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir(&input).expect("mkdir");
        let output = dir.path().join("final.csv");

        let summary = Combiner::new(CombineConfig::new(&input, &output))
            .run()
            .expect("combine");
        assert_eq!(summary.rows_out, 0);

        let mut reader = csv::Reader::from_path(&output).expect("open output");
        let headers: Vec<String> = reader
            .headers()
            .expect("headers")
            .iter()
            .map(|h| h.to_string())
            .collect();
        assert_eq!(headers[0], "paper_id");
        assert_eq!(headers.len(), 13);
        assert!(read_records(&output).is_empty());
    }

    #[test]
    fn test_missing_output_parent_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir(&input).expect("mkdir");
        write_file(&input, "a.csv", "title\nEdge Computing Survey\n");
        let output = dir.path().join("no_such_dir").join("final.csv");

        let err = Combiner::new(CombineConfig::new(&input, &output))
            .run()
            .expect_err("should fail");
        assert!(matches!(err, PaperbaseError::Filesystem { .. }));
    }

    #[test]
    fn test_threshold_override_changes_detection() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.path().join("input");
        std::fs::create_dir(&input).expect("mkdir");
        // Jaccard 0.5: duplicates at threshold 0.5, distinct at 0.85.
        write_file(&input, "a.csv", "title\nEdge Computing Survey\nEdge Computing Platforms\n");
        let output = dir.path().join("final.csv");

        let strict = Combiner::new(CombineConfig::new(&input, &output))
            .run()
            .expect("combine");
        assert_eq!(strict.rows_out, 2);

        let loose = Combiner::new(CombineConfig::new(&input, &output).with_threshold(0.5))
            .run()
            .expect("combine");
        assert_eq!(loose.rows_out, 1);
    }
}
