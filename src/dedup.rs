//! Duplicate detection over the unified table.
//!
//! Exhaustive pairwise comparison of titles: O(n²) similarity computations,
//! each O(|title|) for tokenization. That is a designed-in scaling boundary —
//! this tool targets hundreds to low thousands of records, and replacing the
//! exhaustive scan with approximate indexing (shingling, min-hash) would
//! change which duplicates are detected and must be treated as a distinct
//! algorithm, not an optimization.

use crate::record::PaperRecord;
use crate::similarity::title_similarity;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Find duplicate rows in the unified table.
///
/// Compares every pair `(i, j)` with `i < j` in table order and marks `j` a
/// duplicate when `title_similarity >= threshold`. The earlier-indexed row of
/// a pair is always the canonical one; when several earlier rows match, the
/// earliest match is recorded as the canonical index.
///
/// Returns a map from duplicate index to canonical index. Callers that only
/// need the drop set can take the keys (see [`duplicate_indices`]); the
/// canonical side exists for audit trails and does not affect drop semantics.
pub fn find_duplicates(records: &[PaperRecord], threshold: f64) -> BTreeMap<usize, usize> {
    let mut duplicates: BTreeMap<usize, usize> = BTreeMap::new();

    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            if duplicates.contains_key(&j) {
                continue;
            }
            let score = title_similarity(&records[i].title, &records[j].title);
            if score >= threshold {
                debug!(
                    canonical = i,
                    duplicate = j,
                    score = score,
                    "Duplicate title detected"
                );
                duplicates.insert(j, i);
            }
        }
    }

    info!(
        rows = records.len(),
        duplicates = duplicates.len(),
        threshold = threshold,
        "Duplicate detection complete"
    );

    duplicates
}

/// The unordered set of row indices slated for removal.
pub fn duplicate_indices(duplicates: &BTreeMap<usize, usize>) -> BTreeSet<usize> {
    duplicates.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(titles: &[&str]) -> Vec<PaperRecord> {
        titles
            .iter()
            .map(|t| PaperRecord {
                title: t.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_tie_break_marks_later_index() {
        let records = titled(&["Serverless Computing Survey", "Serverless Computing Survey!!"]);
        let duplicates = find_duplicates(&records, 0.85);
        assert_eq!(duplicate_indices(&duplicates), BTreeSet::from([1]));
        assert_eq!(duplicates.get(&1), Some(&0));
    }

    #[test]
    fn test_idempotent() {
        let records = titled(&[
            "Edge Computing Survey",
            "edge computing survey.",
            "Quantum Networking",
            "Edge Computing Survey",
        ]);
        let first = find_duplicates(&records, 0.85);
        let second = find_duplicates(&records, 0.85);
        assert_eq!(first, second);
    }

    #[test]
    fn test_earliest_canonical_wins_with_multiple_matches() {
        // Index 2 matches both 0 and 1; the canonical index must be 0.
        let records = titled(&[
            "Edge Computing Survey",
            "Edge Computing Survey!",
            "edge computing survey.",
        ]);
        let duplicates = find_duplicates(&records, 0.85);
        assert_eq!(duplicates.get(&1), Some(&0));
        assert_eq!(duplicates.get(&2), Some(&0));
    }

    #[test]
    fn test_distinct_titles_not_marked() {
        let records = titled(&["Edge Computing Survey", "Quantum Networking"]);
        assert!(find_duplicates(&records, 0.85).is_empty());
    }

    #[test]
    fn test_empty_titles_never_match() {
        let records = titled(&["", "", "!!!"]);
        assert!(find_duplicates(&records, 0.85).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Jaccard of these is exactly 0.5.
        let records = titled(&["Edge Computing Survey", "Edge Computing Platforms"]);
        assert_eq!(duplicate_indices(&find_duplicates(&records, 0.5)), BTreeSet::from([1]));
        assert!(find_duplicates(&records, 0.51).is_empty());
    }
}
