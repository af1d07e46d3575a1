//! Identifier extraction from PDF text.
//!
//! Scans the first two pages of a document for a DOI and an arXiv id, keeps
//! the full text of page 1 as a free-text query fallback, and falls back to
//! the file name for the arXiv id. Any parse failure degrades to empty
//! identifiers; this path never errors.

use std::sync::LazyLock;

use lopdf::Document;
use regex::Regex;

use crate::config::api;
use crate::error::{SourceError, SourceResult};
use crate::models::ExtractedIdentifiers;

static DOI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(10\.\d{4,}(?:\.\d+)*/\S+)").expect("DOI pattern compiles")
});

static ARXIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:arXiv:)?(\d{4}\.\d{4,5}(?:v\d+)?)\b").expect("arXiv pattern compiles")
});

/// Strip trailing punctuation that is not part of a DOI.
fn clean_doi(raw: &str) -> &str {
    raw.trim_end_matches(|c| ".,;:)]}>'\"".contains(c))
}

/// Scan per-page text plus the file name for identifiers.
///
/// `pages` holds the raw text of the first pages in order; only the first
/// two are scanned. The first DOI match and the first arXiv match win
/// independently. When the pages yield no arXiv id, the file name is tried
/// with the same pattern (uploads are often named `2301.12345v2.pdf`).
#[must_use]
pub fn scan_pages(pages: &[String], file_name: &str) -> ExtractedIdentifiers {
    let mut doi = None;
    let mut arxiv_id = None;
    let mut first_page_text = String::new();

    for (index, text) in pages.iter().take(api::MAX_SCAN_PAGES).enumerate() {
        if index == 0 {
            first_page_text.clone_from(text);
        }

        if doi.is_none() {
            if let Some(captures) = DOI_RE.captures(text) {
                doi = Some(clean_doi(&captures[1]).to_string());
            }
        }

        if arxiv_id.is_none() {
            if let Some(captures) = ARXIV_RE.captures(text) {
                arxiv_id = Some(captures[1].to_string());
            }
        }
    }

    if arxiv_id.is_none() {
        if let Some(captures) = ARXIV_RE.captures(file_name) {
            arxiv_id = Some(captures[1].to_string());
        }
    }

    ExtractedIdentifiers { doi, arxiv_id, first_page_text }
}

/// Extract identifiers from raw PDF bytes.
///
/// Corrupt or unparseable documents yield all-empty identifiers rather than
/// an error; the metadata lookup then simply has nothing to go on.
#[must_use]
pub fn extract_identifiers(bytes: &[u8], file_name: &str) -> ExtractedIdentifiers {
    match leading_page_texts(bytes) {
        Ok(pages) => scan_pages(&pages, file_name),
        Err(err) => {
            tracing::debug!(error = %err, "identifier extraction failed, degrading to empty");
            scan_pages(&[], file_name)
        }
    }
}

/// Extract the text of every page, newline-joined, for the completion
/// request body.
pub fn extract_full_text(bytes: &[u8]) -> SourceResult<String> {
    let doc = Document::load_mem(bytes).map_err(|e| SourceError::parse(e.to_string()))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut out = Vec::with_capacity(pages.len());
    for page in pages {
        let text =
            doc.extract_text(&[page]).map_err(|e| SourceError::parse(e.to_string()))?;
        out.push(text);
    }

    Ok(out.join("\n"))
}

fn leading_page_texts(bytes: &[u8]) -> SourceResult<Vec<String>> {
    let doc = Document::load_mem(bytes).map_err(|e| SourceError::parse(e.to_string()))?;
    let pages: Vec<u32> =
        doc.get_pages().keys().copied().take(api::MAX_SCAN_PAGES).collect();

    let mut out = Vec::with_capacity(pages.len());
    for page in pages {
        let text =
            doc.extract_text(&[page]).map_err(|e| SourceError::parse(e.to_string()))?;
        out.push(text);
    }

    Ok(out)
}
