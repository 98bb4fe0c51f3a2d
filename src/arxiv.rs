//! arXiv API client.
//!
//! Queries the arXiv Atom feed API and maps entries into the closed
//! [`PaperRecord`] schema. Parsed with quick-xml rather than regex because
//! Atom namespaces make regex parsing brittle; entries missing optional
//! elements (DOI, journal reference) get empty strings like every other
//! source.

use crate::error::{PaperbaseError, Result};
use crate::record::PaperRecord;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// arXiv Atom API endpoint
const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";

/// Search arXiv and return up to `max_results` records.
///
/// Results are requested sorted by submission date descending so repeated
/// queries stay deterministic.
pub async fn search(query: &str, max_results: usize) -> Result<Vec<PaperRecord>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PaperbaseError::Config("arXiv query must be non-empty".to_string()));
    }

    let mut url = Url::parse(ARXIV_API_URL)
        .map_err(|e| PaperbaseError::Config(format!("Invalid arXiv endpoint: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("search_query", &build_search_query(query))
        .append_pair("start", "0")
        .append_pair("max_results", &max_results.to_string())
        .append_pair("sortBy", "submittedDate")
        .append_pair("sortOrder", "descending");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PaperbaseError::Config(format!("Failed to build HTTP client: {}", e)))?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PaperbaseError::Api {
            code: status.as_u16() as i32,
            message: format!("arXiv API error: {}", status),
        });
    }

    let body = response.text().await?;
    let records = parse_feed(&body)?;
    info!(query = query, found = records.len(), "arXiv search complete");
    Ok(records)
}

/// Build the arXiv `search_query` value, quoting multi-word phrases.
fn build_search_query(query: &str) -> String {
    if query.contains(' ') {
        format!("all:\"{}\"", query.replace('"', ""))
    } else {
        format!("all:{}", query)
    }
}

/// Collapse runs of whitespace; arXiv wraps long titles and abstracts.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull-parse an Atom feed into records.
///
/// Works on local element names so namespace prefixes (`arxiv:doi`,
/// `arxiv:journal_ref`) resolve the same as unprefixed elements.
fn parse_feed(body: &str) -> Result<Vec<PaperRecord>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    #[derive(Default)]
    struct Entry {
        url: String,
        title: String,
        summary: String,
        published: String,
        doi: String,
        journal_ref: String,
        authors: Vec<String>,
        in_author: bool,
    }

    fn record_from_entry(entry: Entry) -> PaperRecord {
        // RFC3339 timestamps; the year is the first four characters.
        let year = entry.published.get(0..4).unwrap_or("").to_string();
        PaperRecord {
            paper_id: String::new(),
            title: entry.title,
            abstract_text: entry.summary,
            authors: entry.authors.join(", "),
            journal: entry.journal_ref,
            year,
            volume: String::new(),
            issue: String::new(),
            pages: String::new(),
            publisher: String::new(),
            doi: entry.doi,
            url: entry.url,
            record_type: "preprint".to_string(),
        }
    }

    let mut records = Vec::new();
    let mut entry: Option<Entry> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = local_name(e.name().as_ref());
                if name == "entry" {
                    entry = Some(Entry::default());
                } else if let Some(cur) = entry.as_mut() {
                    if name == "author" {
                        cur.in_author = true;
                    }
                }
                text.clear();
            }
            Ok(Event::Text(t)) => {
                let chunk = t
                    .unescape()
                    .map_err(|e| PaperbaseError::Parse(format!("arXiv feed text: {}", e)))?;
                text.push_str(&chunk);
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.name().as_ref());
                if name == "entry" {
                    if let Some(done) = entry.take() {
                        records.push(record_from_entry(done));
                    }
                } else if let Some(cur) = entry.as_mut() {
                    let value = normalize_ws(&text);
                    match name.as_str() {
                        "id" => cur.url = value,
                        "title" => cur.title = value,
                        "summary" => cur.summary = value,
                        "published" => cur.published = value,
                        "doi" => cur.doi = value,
                        "journal_ref" => cur.journal_ref = value,
                        "name" if cur.in_author => {
                            if !value.is_empty() {
                                cur.authors.push(value);
                            }
                        }
                        "author" => cur.in_author = false,
                        _ => {}
                    }
                }
                text.clear();
            }
            Err(e) => {
                warn!(error = %e, parsed = records.len(), "arXiv feed parse stopped early");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn local_name(name: &[u8]) -> String {
    let full = String::from_utf8_lossy(name);
    full.rsplit(':').next().unwrap_or(&full).to_string()
}
