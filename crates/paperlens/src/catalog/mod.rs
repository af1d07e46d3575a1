//! Catalog clients and the metadata resolution chain.
//!
//! Each client maps one external schema onto [`PaperMetadata`]; the
//! resolver runs them in a fixed order, treating every failure as "this
//! source has nothing" and moving on. Lookups are strictly sequential:
//! later sources are only consulted after the prior one definitively came
//! up empty, so the chain's priority order is preserved.

pub mod arxiv;
pub mod crossref;
pub mod semantic_scholar;

pub use arxiv::ArxivClient;
pub use crossref::CrossrefClient;
pub use semantic_scholar::SemanticScholarClient;

use crate::config::Config;
use crate::error::{SourceError, SourceResult};
use crate::models::PaperMetadata;

/// Inputs for one resolution attempt. At least one field should be set;
/// with none, resolution trivially fails.
#[derive(Debug, Clone, Default)]
pub struct LookupRequest {
    /// Exact DOI, highest priority.
    pub doi: Option<String>,

    /// arXiv id, possibly carrying a version suffix.
    pub arxiv_id: Option<String>,

    /// Free text (typically the first page) for the search fallback.
    pub query: Option<String>,
}

/// Runs the catalog fallback chain.
pub struct MetadataResolver {
    crossref: CrossrefClient,
    semantic_scholar: SemanticScholarClient,
    arxiv: ArxivClient,
}

impl MetadataResolver {
    /// Create a resolver with one client per catalog.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            crossref: CrossrefClient::new(config)?,
            semantic_scholar: SemanticScholarClient::new(config)?,
            arxiv: ArxivClient::new(config)?,
        })
    }

    /// Resolve one canonical record, or `None` when every applicable source
    /// came up empty. Never errors; source failures are absorbed here.
    pub async fn resolve(&self, request: &LookupRequest) -> Option<PaperMetadata> {
        let mut metadata = None;

        if let Some(doi) = request.doi.as_deref() {
            metadata = attempt("crossref", self.crossref.fetch_doi(doi).await);
            if metadata.is_none() {
                let key = format!("DOI:{doi}");
                metadata = attempt("semantic-scholar", self.semantic_scholar.fetch_by_key(&key).await);
            }
        } else if let Some(arxiv_id) = request.arxiv_id.as_deref() {
            metadata = attempt("arxiv", self.arxiv.fetch(arxiv_id).await);
            if metadata.is_none() {
                let key = format!("ARXIV:{arxiv_id}");
                metadata = attempt("semantic-scholar", self.semantic_scholar.fetch_by_key(&key).await);
            }
            if metadata.is_none() {
                let key = format!("ARXIV:{}", arxiv::strip_version(arxiv_id));
                metadata = attempt("semantic-scholar", self.semantic_scholar.fetch_by_key(&key).await);
            }
        }

        // Free-text search is a last resort, and only when no arXiv id was
        // supplied at all: an id that failed three lookups is better
        // reported as unknown than mismatched against a fuzzy search hit.
        if metadata.is_none() && request.arxiv_id.is_none() {
            if let Some(query) = request.query.as_deref().filter(|q| !q.trim().is_empty()) {
                metadata = attempt("crossref-search", self.crossref.search(query).await);
            }
        }

        metadata
    }
}

/// Collapse a source failure into "nothing found", logging the cause.
fn attempt(source: &str, result: SourceResult<PaperMetadata>) -> Option<PaperMetadata> {
    match result {
        Ok(metadata) => {
            tracing::debug!(source, title = %metadata.title, "catalog hit");
            Some(metadata)
        }
        Err(SourceError::NotFound) => {
            tracing::debug!(source, "catalog has no record");
            None
        }
        Err(err) => {
            tracing::warn!(source, error = %err, "catalog lookup failed, trying next source");
            None
        }
    }
}
