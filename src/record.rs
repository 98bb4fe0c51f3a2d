//! Paper record schema.
//!
//! Every stage of the pipeline works on [`PaperRecord`], one row of the
//! unified table. The schema is closed: the twelve fields in
//! [`REQUIRED_COLUMNS`] are always present (possibly empty), unknown source
//! columns are dropped, and `paper_id` only carries meaning after the final
//! renumbering pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The twelve non-id fields every record carries. Order doubles as the CSV
/// column order after `paper_id`.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "title",
    "abstract",
    "authors",
    "journal",
    "year",
    "volume",
    "issue",
    "pages",
    "publisher",
    "doi",
    "url",
    "type",
];

/// One row of the unified table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Stable identifier `paper_NNN`, assigned only by the final renumber pass
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub pages: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub record_type: String,
}

impl PaperRecord {
    /// Build a record from a field-name → value mapping.
    ///
    /// This is the collaborator interface for external ingestion sources:
    /// any component feeding the combiner supplies rows keyed by the field
    /// names in [`REQUIRED_COLUMNS`] (plus an optional `paper_id`). Missing
    /// keys become empty strings, unknown keys are ignored.
    pub fn from_row(row: &HashMap<String, String>) -> Self {
        let get = |key: &str| row.get(key).cloned().unwrap_or_default();
        Self {
            paper_id: get("paper_id"),
            title: get("title"),
            abstract_text: get("abstract"),
            authors: get("authors"),
            journal: get("journal"),
            year: get("year"),
            volume: get("volume"),
            issue: get("issue"),
            pages: get("pages"),
            publisher: get("publisher"),
            doi: get("doi"),
            url: get("url"),
            record_type: get("type"),
        }
    }

    /// Fill every empty non-id field from `other`.
    ///
    /// Used when enriching a source record with a second source's metadata:
    /// existing values always win, only gaps are backfilled. `paper_id` is
    /// never touched.
    pub fn fill_missing_from(&mut self, other: &PaperRecord) {
        fn fill(target: &mut String, source: &str) {
            if target.is_empty() && !source.is_empty() {
                *target = source.to_string();
            }
        }
        fill(&mut self.title, &other.title);
        fill(&mut self.abstract_text, &other.abstract_text);
        fill(&mut self.authors, &other.authors);
        fill(&mut self.journal, &other.journal);
        fill(&mut self.year, &other.year);
        fill(&mut self.volume, &other.volume);
        fill(&mut self.issue, &other.issue);
        fill(&mut self.pages, &other.pages);
        fill(&mut self.publisher, &other.publisher);
        fill(&mut self.doi, &other.doi);
        fill(&mut self.url, &other.url);
        fill(&mut self.record_type, &other.record_type);
    }

    /// Look up a field by its schema name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "paper_id" => &self.paper_id,
            "title" => &self.title,
            "abstract" => &self.abstract_text,
            "authors" => &self.authors,
            "journal" => &self.journal,
            "year" => &self.year,
            "volume" => &self.volume,
            "issue" => &self.issue,
            "pages" => &self.pages,
            "publisher" => &self.publisher,
            "doi" => &self.doi,
            "url" => &self.url,
            "type" => &self.record_type,
            _ => return None,
        };
        Some(value)
    }
}

/// Format a zero-based table position as a `paper_NNN` identifier.
///
/// Positions are 1-based in the id itself: position 0 becomes `paper_001`.
pub fn format_paper_id(position: usize) -> String {
    format!("paper_{:03}", position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_paper_id() {
        assert_eq!(format_paper_id(0), "paper_001");
        assert_eq!(format_paper_id(41), "paper_042");
        assert_eq!(format_paper_id(999), "paper_1000");
    }

    #[test]
    fn test_from_row_backfills_missing_fields() {
        let mut row = HashMap::new();
        row.insert("title".to_string(), "Edge Computing Survey".to_string());
        row.insert("ignored_column".to_string(), "dropped".to_string());

        let record = PaperRecord::from_row(&row);
        assert_eq!(record.title, "Edge Computing Survey");
        assert_eq!(record.doi, "");
        assert_eq!(record.paper_id, "");
        for column in REQUIRED_COLUMNS {
            assert!(record.field(column).is_some());
        }
    }

    #[test]
    fn test_fill_missing_from_only_backfills_gaps() {
        let mut record = PaperRecord {
            paper_id: "paper_001".to_string(),
            title: "Edge Computing Survey".to_string(),
            year: "2022".to_string(),
            ..Default::default()
        };
        let enrichment = PaperRecord {
            paper_id: "paper_999".to_string(),
            title: "A survey on edge computing".to_string(),
            year: "2023".to_string(),
            doi: "10.1234/test".to_string(),
            journal: "IEEE Access".to_string(),
            ..Default::default()
        };

        record.fill_missing_from(&enrichment);
        // Existing values win, gaps are filled, paper_id is untouched.
        assert_eq!(record.title, "Edge Computing Survey");
        assert_eq!(record.year, "2022");
        assert_eq!(record.doi, "10.1234/test");
        assert_eq!(record.journal, "IEEE Access");
        assert_eq!(record.paper_id, "paper_001");
    }

    #[test]
    fn test_field_rejects_unknown_names() {
        let record = PaperRecord::default();
        assert!(record.field("ignored_column").is_none());
    }

    #[test]
    fn test_schema_has_twelve_fields() {
        assert_eq!(REQUIRED_COLUMNS.len(), 12);
    }
}
