//! CrossRef client: exact DOI lookup and bibliographic free-text search.
//!
//! Both paths normalize through the same work-record mapping. CrossRef asks
//! polite-pool users to identify themselves, so the client always sends a
//! `mailto` User-Agent.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::config::{Config, api};
use crate::error::{SourceError, SourceResult};
use crate::models::{PaperMetadata, UNTITLED};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: Work,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    message: SearchMessage,
}

#[derive(Debug, Deserialize)]
struct SearchMessage {
    #[serde(default)]
    items: Vec<Work>,
}

/// A CrossRef work record; only the fields the canonical mapping reads.
#[derive(Debug, Default, Deserialize)]
struct Work {
    #[serde(default)]
    title: Vec<String>,

    #[serde(default, rename = "short-title")]
    short_title: Vec<String>,

    #[serde(default)]
    author: Vec<WorkAuthor>,

    #[serde(default)]
    published: Option<WorkDate>,

    #[serde(default, rename = "published-print")]
    published_print: Option<WorkDate>,

    #[serde(default, rename = "published-online")]
    published_online: Option<WorkDate>,

    #[serde(default, rename = "container-title")]
    container_title: Vec<String>,

    #[serde(default, rename = "short-container-title")]
    short_container_title: Vec<String>,

    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,

    #[serde(default, rename = "URL")]
    url: Option<String>,

    #[serde(default, rename = "DOI")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    #[serde(default)]
    given: Option<String>,

    #[serde(default)]
    family: Option<String>,
}

/// Date-parts container; entries may be partial or null.
#[derive(Debug, Deserialize)]
struct WorkDate {
    #[serde(default, rename = "date-parts")]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl WorkDate {
    fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first().copied().flatten()
    }
}

/// Client for the CrossRef REST API.
pub struct CrossrefClient {
    client: reqwest::Client,
    base_url: String,
    search_timeout: std::time::Duration,
}

impl CrossrefClient {
    /// Create a client with the polite-pool User-Agent and lookup timeout.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(api::USER_AGENT)
            .timeout(config.lookup_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.crossref_url.clone(),
            search_timeout: config.search_timeout,
        })
    }

    /// Fetch a work by exact DOI.
    pub async fn fetch_doi(&self, doi: &str) -> SourceResult<PaperMetadata> {
        let url = format!("{}/works/{}", self.base_url, doi);
        tracing::debug!(%url, "crossref exact lookup");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(status.as_u16()));
        }

        let body: WorksResponse = response.json().await?;
        Ok(work_to_metadata(body.message, doi.to_string()))
    }

    /// Free-text bibliographic search, returning only the top-ranked work.
    ///
    /// The query is truncated to its first 200 characters; a top result
    /// without a DOI counts as no result at all.
    pub async fn search(&self, query: &str) -> SourceResult<PaperMetadata> {
        let trimmed: String = query.chars().take(api::QUERY_MAX_CHARS).collect();
        let trimmed = trimmed.trim();
        if trimmed.is_empty() {
            return Err(SourceError::NotFound);
        }

        let url = format!("{}/works", self.base_url);
        tracing::debug!(query = %trimmed, "crossref bibliographic search");

        let response = self
            .client
            .get(&url)
            .query(&[("query.bibliographic", trimmed), ("rows", "1")])
            .timeout(self.search_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        let work = body.message.items.into_iter().next().ok_or(SourceError::NotFound)?;
        let doi = work.doi.clone().filter(|d| !d.is_empty()).ok_or(SourceError::NotFound)?;

        Ok(work_to_metadata(work, doi))
    }
}

/// Map a CrossRef work onto the canonical record.
fn work_to_metadata(work: Work, doi: String) -> PaperMetadata {
    let title = work
        .title
        .into_iter()
        .next()
        .or_else(|| work.short_title.into_iter().next())
        .unwrap_or_else(|| UNTITLED.to_string());

    let authors = work
        .author
        .into_iter()
        .map(|author| {
            [author.given, author.family]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let year = work
        .published
        .as_ref()
        .and_then(WorkDate::year)
        .or_else(|| work.published_print.as_ref().and_then(WorkDate::year))
        .or_else(|| work.published_online.as_ref().and_then(WorkDate::year));

    let journal = work
        .container_title
        .into_iter()
        .next()
        .or_else(|| work.short_container_title.into_iter().next());

    let abstract_text = work
        .abstract_text
        .map(|text| TAG_RE.replace_all(&text, "").trim().to_string())
        .filter(|text| !text.is_empty());

    let url = work.url.or_else(|| Some(format!("https://doi.org/{doi}")));

    PaperMetadata { doi, title, authors, journal, year, abstract_text, url }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_from_json(json: serde_json::Value) -> Work {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_title_precedence_and_placeholder() {
        let work = work_from_json(serde_json::json!({"title": ["Main"], "short-title": ["M"]}));
        assert_eq!(work_to_metadata(work, "10.1/x".into()).title, "Main");

        let work = work_from_json(serde_json::json!({"short-title": ["Short"]}));
        assert_eq!(work_to_metadata(work, "10.1/x".into()).title, "Short");

        let work = work_from_json(serde_json::json!({}));
        assert_eq!(work_to_metadata(work, "10.1/x".into()).title, "Untitled");
    }

    #[test]
    fn test_authors_join_only_present_parts() {
        let work = work_from_json(serde_json::json!({
            "author": [
                {"given": "Grace", "family": "Hopper"},
                {"family": "Knuth"},
                {"given": "Ada"}
            ]
        }));

        let meta = work_to_metadata(work, "10.1/x".into());
        assert_eq!(meta.authors, vec!["Grace Hopper", "Knuth", "Ada"]);
    }

    #[test]
    fn test_year_fallback_order() {
        let work = work_from_json(serde_json::json!({
            "published-online": {"date-parts": [[2019, 4]]},
            "published-print": {"date-parts": [[2020]]}
        }));
        assert_eq!(work_to_metadata(work, "10.1/x".into()).year, Some(2020));

        let work = work_from_json(serde_json::json!({
            "published": {"date-parts": [[2021, 1, 15]]},
            "published-print": {"date-parts": [[2022]]}
        }));
        assert_eq!(work_to_metadata(work, "10.1/x".into()).year, Some(2021));
    }

    #[test]
    fn test_null_date_parts_tolerated() {
        let work = work_from_json(serde_json::json!({
            "published": {"date-parts": [[null]]},
            "published-online": {"date-parts": [[2018]]}
        }));
        assert_eq!(work_to_metadata(work, "10.1/x".into()).year, Some(2018));
    }

    #[test]
    fn test_abstract_tags_stripped_and_trimmed() {
        let work = work_from_json(serde_json::json!({
            "abstract": " <jats:p>We present <jats:italic>results</jats:italic>.</jats:p> "
        }));
        let meta = work_to_metadata(work, "10.1/x".into());
        assert_eq!(meta.abstract_text.as_deref(), Some("We present results."));
    }

    #[test]
    fn test_url_synthesized_from_doi_when_missing() {
        let work = work_from_json(serde_json::json!({}));
        let meta = work_to_metadata(work, "10.1000/abc".into());
        assert_eq!(meta.url.as_deref(), Some("https://doi.org/10.1000/abc"));

        let work = work_from_json(serde_json::json!({"URL": "https://dl.acm.org/doi/xyz"}));
        let meta = work_to_metadata(work, "10.1000/abc".into());
        assert_eq!(meta.url.as_deref(), Some("https://dl.acm.org/doi/xyz"));
    }
}
