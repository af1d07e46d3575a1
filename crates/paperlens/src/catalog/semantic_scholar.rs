//! Semantic Scholar Graph API lookup by external-identifier key.
//!
//! The resolver addresses papers as `DOI:<doi>` or `ARXIV:<id>`; the Graph
//! API resolves either form through the same paper endpoint.

use serde::Deserialize;

use crate::config::Config;
use crate::error::{SourceError, SourceResult};
use crate::models::{PaperMetadata, UNTITLED};

const PAPER_FIELDS: &str = "title,authors,year,abstract,externalIds,venue,url";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SsPaper {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    authors: Vec<SsAuthor>,

    #[serde(default)]
    year: Option<i32>,

    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,

    #[serde(default)]
    external_ids: Option<SsExternalIds>,

    #[serde(default)]
    venue: Option<String>,

    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SsAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SsExternalIds {
    #[serde(default, rename = "DOI")]
    doi: Option<String>,
}

/// Client for the Semantic Scholar Graph API.
pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
}

impl SemanticScholarClient {
    /// Create a client with the lookup timeout applied.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client, base_url: config.semantic_scholar_url.clone() })
    }

    /// Fetch a paper by `DOI:<doi>` / `ARXIV:<id>` key.
    pub async fn fetch_by_key(&self, paper_key: &str) -> SourceResult<PaperMetadata> {
        let url = format!("{}/graph/v1/paper/{}", self.base_url, paper_key);
        tracing::debug!(%url, "semantic scholar lookup");

        let response = self.client.get(&url).query(&[("fields", PAPER_FIELDS)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(status.as_u16()));
        }

        let paper: SsPaper = response.json().await?;
        Ok(paper_to_metadata(paper))
    }
}

fn paper_to_metadata(paper: SsPaper) -> PaperMetadata {
    let doi = paper
        .external_ids
        .and_then(|ids| ids.doi)
        .unwrap_or_default();

    let url = paper.url.or_else(|| {
        if doi.is_empty() { None } else { Some(format!("https://doi.org/{doi}")) }
    });

    PaperMetadata {
        title: paper.title.unwrap_or_else(|| UNTITLED.to_string()),
        authors: paper.authors.into_iter().filter_map(|a| a.name).collect(),
        journal: paper.venue.filter(|v| !v.is_empty()),
        year: paper.year,
        abstract_text: paper.abstract_text,
        url,
        doi,
    }
}
