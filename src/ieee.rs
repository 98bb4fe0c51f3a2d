//! IEEE Xplore API client.
//!
//! Queries the IEEE Xplore metadata search API (JSON, API key required) and
//! maps articles into the closed [`PaperRecord`] schema.

use crate::error::{PaperbaseError, Result};
use crate::record::PaperRecord;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// IEEE Xplore search API base URL
const IEEE_API_URL: &str = "https://ieeexploreapi.ieee.org/api/v1/search/articles";

/// IEEE Xplore API client
pub struct IeeeClient {
    client: reqwest::Client,
    api_key: String,
}

impl IeeeClient {
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PaperbaseError::Config(
                "IEEE Xplore requires an API key".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaperbaseError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, api_key })
    }

    /// Search articles by free-text query, returning up to `max_records`.
    pub async fn search(&self, query: &str, max_records: usize) -> Result<Vec<PaperRecord>> {
        let response = self
            .client
            .get(IEEE_API_URL)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("querytext", query),
                ("max_records", &max_records.to_string()),
                ("start_record", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaperbaseError::Api {
                code: status.as_u16() as i32,
                message: format!("IEEE Xplore API error: {} - {}", status, body),
            });
        }

        let data: IeeeResponse = response.json().await?;
        let records: Vec<PaperRecord> = data.articles.into_iter().map(record_from_article).collect();
        info!(
            query = query,
            total_records = data.total_records,
            returned = records.len(),
            "IEEE Xplore search complete"
        );
        Ok(records)
    }
}

// === IEEE Xplore API Response Types ===

#[derive(Debug, Deserialize)]
struct IeeeResponse {
    #[serde(default)]
    total_records: u64,
    #[serde(default)]
    articles: Vec<IeeeArticle>,
}

#[derive(Debug, Default, Deserialize)]
struct IeeeArticle {
    #[serde(default)]
    title: String,
    #[serde(rename = "abstract", default)]
    abstract_text: String,
    #[serde(default)]
    authors: Option<IeeeAuthors>,
    #[serde(default)]
    publication_title: String,
    #[serde(default)]
    publication_year: String,
    #[serde(default)]
    volume: String,
    #[serde(default)]
    issue: String,
    #[serde(default)]
    start_page: String,
    #[serde(default)]
    end_page: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    doi: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    content_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct IeeeAuthors {
    #[serde(default)]
    authors: Vec<IeeeAuthor>,
}

#[derive(Debug, Default, Deserialize)]
struct IeeeAuthor {
    #[serde(default)]
    full_name: String,
}

/// Map an IEEE Xplore article into the record schema.
fn record_from_article(article: IeeeArticle) -> PaperRecord {
    let authors = article
        .authors
        .map(|a| {
            a.authors
                .into_iter()
                .map(|a| a.full_name)
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    let pages = match (article.start_page.as_str(), article.end_page.as_str()) {
        ("", _) | (_, "") => format!("{}{}", article.start_page, article.end_page),
        (start, end) => format!("{}-{}", start, end),
    };

    PaperRecord {
        paper_id: String::new(),
        title: article.title,
        abstract_text: article.abstract_text,
        authors,
        journal: article.publication_title,
        year: article.publication_year,
        volume: article.volume,
        issue: article.issue,
        pages,
        publisher: article.publisher,
        doi: article.doi,
        url: article.html_url,
        record_type: article.content_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_article() {
        let payload = serde_json::json!({
            "total_records": 1,
            "articles": [{
                "title": "Edge Computing Survey",
                "abstract": "A survey.",
                "authors": {"authors": [{"full_name": "Jane Roe"}, {"full_name": "John Doe"}]},
                "publication_title": "IEEE Internet of Things Journal",
                "publication_year": "2023",
                "volume": "10",
                "issue": "4",
                "start_page": "100",
                "end_page": "120",
                "publisher": "IEEE",
                "doi": "10.1109/JIOT.2023.1234",
                "html_url": "https://ieeexplore.ieee.org/document/1234",
                "content_type": "Journals"
            }]
        });

        let response: IeeeResponse = serde_json::from_value(payload).expect("parse");
        assert_eq!(response.total_records, 1);

        let record = record_from_article(response.articles.into_iter().next().expect("article"));
        assert_eq!(record.title, "Edge Computing Survey");
        assert_eq!(record.authors, "Jane Roe, John Doe");
        assert_eq!(record.journal, "IEEE Internet of Things Journal");
        assert_eq!(record.pages, "100-120");
        assert_eq!(record.record_type, "Journals");
    }

    #[test]
    fn test_pages_with_missing_end_page() {
        let article = IeeeArticle {
            start_page: "55".to_string(),
            ..Default::default()
        };
        let record = record_from_article(article);
        assert_eq!(record.pages, "55");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(IeeeClient::new("  ".to_string()).is_err());
    }
}
