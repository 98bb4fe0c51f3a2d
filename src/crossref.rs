//! CrossRef API client.
//!
//! Looks up paper metadata via the CrossRef works API, by free-text title
//! query or by DOI, and maps responses into the closed [`PaperRecord`]
//! schema. Batch lookups run with bounded concurrency and exponential
//! backoff on rate limiting.

use crate::error::{PaperbaseError, Result};
use crate::record::PaperRecord;
use futures::future::join_all;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// CrossRef API base URL
const CROSSREF_API_URL: &str = "https://api.crossref.org/works";

/// Polite pool email for CrossRef API
const MAILTO: &str = "paperbase@example.com";

/// Fields requested from the works endpoint
const SELECT_FIELDS: &str =
    "DOI,title,author,container-title,published,abstract,volume,issue,page,publisher,URL,type";

/// CrossRef API client with rate limiting and concurrency control
pub struct CrossrefClient {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
}

impl CrossrefClient {
    /// Create a new client limited to `max_workers` concurrent requests.
    pub fn new(max_workers: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("paperbase/0.1 (mailto:{})", MAILTO))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| PaperbaseError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_retries: 3,
        })
    }

    /// Search works by free-text query, returning up to `rows` records.
    pub async fn search(&self, query: &str, rows: usize) -> Result<Vec<PaperRecord>> {
        let response = self
            .client
            .get(CROSSREF_API_URL)
            .query(&[
                ("query", query),
                ("rows", &rows.to_string()),
                ("select", SELECT_FIELDS),
                ("mailto", MAILTO),
            ])
            .send()
            .await?;

        let data: CrossrefResponse = check_status(response).await?.json().await?;
        let records: Vec<PaperRecord> = data.message.items.into_iter().map(record_from_item).collect();
        info!(query = query, found = records.len(), "CrossRef search complete");
        Ok(records)
    }

    /// Fetch a single work by DOI.
    ///
    /// Returns `Ok(None)` when the DOI is unknown to CrossRef.
    pub async fn lookup_by_doi(&self, doi: &str) -> Result<Option<PaperRecord>> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/{}", CROSSREF_API_URL, doi);
        let response = self
            .client
            .get(&url)
            .query(&[("mailto", MAILTO)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let data: CrossrefWorkResponse = check_status(response).await?.json().await?;
        Ok(Some(record_from_item(data.message)))
    }

    /// Lookup the best match for one title.
    ///
    /// Retries with exponential backoff on rate limiting; returns `None`
    /// when nothing matched or all attempts failed.
    pub async fn lookup_by_title(&self, title: &str) -> Option<PaperRecord> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let _permit = self.semaphore.acquire().await.ok()?;

        let title_prefix = truncate_chars(title, 30);
        let mut backoff = Duration::from_millis(500);

        for attempt in 0..self.max_retries {
            match self.do_title_lookup(title).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => return None,
                Err(PaperbaseError::RateLimited(secs)) => {
                    let wait = Duration::from_secs(secs).max(backoff);
                    warn!(
                        title = title_prefix,
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, waiting"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                }
                Err(e) => {
                    debug!(
                        title = title_prefix,
                        attempt = attempt + 1,
                        error = %e,
                        "Lookup failed"
                    );
                    if attempt < self.max_retries - 1 {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        None
    }

    async fn do_title_lookup(&self, title: &str) -> Result<Option<PaperRecord>> {
        let response = self
            .client
            .get(CROSSREF_API_URL)
            .query(&[
                ("query.title", title),
                ("rows", "1"),
                ("select", SELECT_FIELDS),
                ("mailto", MAILTO),
            ])
            .send()
            .await?;

        let data: CrossrefResponse = check_status(response).await?.json().await?;
        Ok(data.message.items.into_iter().next().map(record_from_item))
    }

    /// Lookup multiple titles concurrently.
    ///
    /// Returns a vector with the same length as input, `None` for misses.
    pub async fn lookup_batch(&self, titles: &[String]) -> Vec<Option<PaperRecord>> {
        info!(count = titles.len(), "Starting batch CrossRef lookup");

        let futures: Vec<_> = titles
            .iter()
            .map(|title| self.lookup_by_title(title))
            .collect();

        let results = join_all(futures).await;

        let matched = results.iter().filter(|r| r.is_some()).count();
        info!(
            total = titles.len(),
            matched = matched,
            "Batch lookup complete"
        );

        results
    }
}

/// Map HTTP error statuses to crate errors, passing successes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(PaperbaseError::RateLimited(5));
    }
    if !response.status().is_success() {
        return Err(PaperbaseError::Api {
            code: response.status().as_u16() as i32,
            message: format!("CrossRef API error: {}", response.status()),
        });
    }
    Ok(response)
}

// === CrossRef API Response Types ===

#[derive(Debug, serde::Deserialize)]
struct CrossrefResponse {
    message: CrossrefMessage,
}

#[derive(Debug, serde::Deserialize)]
struct CrossrefMessage {
    #[serde(default)]
    items: Vec<CrossrefItem>,
}

#[derive(Debug, serde::Deserialize)]
struct CrossrefWorkResponse {
    message: CrossrefItem,
}

#[derive(Debug, Default, serde::Deserialize)]
struct CrossrefItem {
    #[serde(rename = "DOI", default)]
    doi: String,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CrossrefAuthor>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(default)]
    published: Option<CrossrefPublished>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(default)]
    volume: String,
    #[serde(default)]
    issue: String,
    #[serde(default)]
    page: String,
    #[serde(default)]
    publisher: String,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "type", default)]
    work_type: String,
}

#[derive(Debug, serde::Deserialize)]
struct CrossrefAuthor {
    #[serde(default)]
    given: String,
    #[serde(default)]
    family: String,
}

#[derive(Debug, serde::Deserialize)]
struct CrossrefPublished {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<i32>>,
}

/// Map a CrossRef work item into the record schema.
fn record_from_item(item: CrossrefItem) -> PaperRecord {
    let authors = item
        .author
        .iter()
        .map(|a| format!("{} {}", a.given, a.family).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let year = item
        .published
        .and_then(|p| p.date_parts.into_iter().next())
        .and_then(|parts| parts.first().copied())
        .map(|y| y.to_string())
        .unwrap_or_default();

    let journal = item.container_title.into_iter().next().unwrap_or_default();

    // CrossRef abstracts arrive as JATS XML fragments.
    let abstract_text = item
        .abstract_text
        .map(|s| strip_html_tags(&s))
        .unwrap_or_default();

    let title = item.title.into_iter().next().unwrap_or_default();

    PaperRecord {
        paper_id: String::new(),
        title,
        abstract_text,
        authors,
        journal,
        year,
        volume: item.volume,
        issue: item.issue,
        pages: item.page,
        publisher: item.publisher,
        doi: item.doi,
        url: item.url,
        record_type: item.work_type,
    }
}

/// Truncate a string to at most `max_chars` characters, on a char boundary.
///
/// Byte-slicing a title can split a multibyte character and panic; log
/// prefixes go through here instead.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Strip HTML/JATS tags from text
fn strip_html_tags(text: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE
        .get_or_init(|| Regex::new(r"<[^>]+>").unwrap_or_else(|_| Regex::new(r"").expect("Empty regex")));
    re.replace_all(text, "").trim().to_string()
}
