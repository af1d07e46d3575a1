//! arXiv Atom feed lookup by identifier.
//!
//! The export API wraps one `<entry>` per id in an Atom feed. The handful
//! of fields we need are pulled with tag-scoped patterns and entity
//! decoding; a feed whose entry title is empty after trimming is treated as
//! a failed lookup so malformed entries don't short-circuit the fallback
//! chain.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{SourceError, SourceResult};
use crate::models::PaperMetadata;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern"));

static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<summary[^>]*>(.*?)</summary>").expect("summary pattern"));

static PUBLISHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<published[^>]*>(.*?)</published>").expect("published pattern")
});

static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<author>\s*<name>(.*?)</name>\s*</author>").expect("author pattern")
});

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<id[^>]*>(.*?)</id>").expect("id pattern"));

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)v\d+$").expect("version pattern"));

/// Drop a trailing `vN` version suffix from an arXiv id.
#[must_use]
pub fn strip_version(arxiv_id: &str) -> String {
    VERSION_RE.replace(arxiv_id, "").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Nth occurrence of a tag's inner text. The feed carries its own `<title>`
/// and `<id>` before the entry's, so entry fields sit at occurrence 2.
fn nth_tag(re: &Regex, xml: &str, occurrence: usize) -> Option<String> {
    re.captures_iter(xml).nth(occurrence - 1).map(|c| c[1].to_string())
}

/// Client for the arXiv export API.
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    /// Create a client with the lookup timeout applied.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client, base_url: config.arxiv_url.clone() })
    }

    /// Fetch a paper by arXiv id; any version suffix is stripped before the
    /// request since the feed serves the latest version either way.
    pub async fn fetch(&self, arxiv_id: &str) -> SourceResult<PaperMetadata> {
        let id = strip_version(arxiv_id);
        let url = format!("{}/api/query", self.base_url);
        tracing::debug!(%id, "arxiv feed lookup");

        let response = self.client.get(&url).query(&[("id_list", id.as_str())]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(status.as_u16()));
        }

        let xml = response.text().await?;
        feed_to_metadata(&xml)
    }
}

fn feed_to_metadata(xml: &str) -> SourceResult<PaperMetadata> {
    let title = nth_tag(&TITLE_RE, xml, 2)
        .map(|t| decode_entities(&t).trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(SourceError::NotFound)?;

    let authors = AUTHOR_RE
        .captures_iter(xml)
        .map(|c| decode_entities(&c[1]).trim().to_string())
        .collect();

    let year = nth_tag(&PUBLISHED_RE, xml, 1)
        .and_then(|published| published.trim().get(..4).map(str::to_string))
        .and_then(|prefix| prefix.parse::<i32>().ok());

    let abstract_text = nth_tag(&SUMMARY_RE, xml, 1)
        .map(|s| decode_entities(&s).trim().to_string())
        .filter(|s| !s.is_empty());

    let url = nth_tag(&ID_RE, xml, 2).map(|u| decode_entities(&u).trim().to_string());

    Ok(PaperMetadata {
        doi: String::new(),
        title,
        authors,
        journal: Some("arXiv".to_string()),
        year,
        abstract_text,
        url,
    })
}
