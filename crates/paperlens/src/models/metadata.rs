//! Canonical bibliographic record and identifier extraction output.

use serde::{Deserialize, Serialize};

/// Placeholder title used when a catalog supplies none.
pub const UNTITLED: &str = "Untitled";

/// Canonical paper metadata, normalized from whichever catalog answered.
///
/// `title` is always present (falls back to [`UNTITLED`]); `doi` may be
/// empty (arXiv-only records). Optional fields are omitted from JSON when
/// absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaperMetadata {
    /// DOI, or empty string when the source record has none.
    pub doi: String,

    /// Paper title, never empty.
    pub title: String,

    /// Author display names in source order.
    pub authors: Vec<String>,

    /// Journal or venue name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    /// Publication year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Abstract with markup stripped.
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    /// Canonical URL for the work.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Identifiers located in an uploaded document.
///
/// Produced once per upload and consumed exactly once by the resolver.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIdentifiers {
    /// DOI found in the scanned pages, trailing punctuation stripped.
    pub doi: Option<String>,

    /// arXiv id, version suffix kept when present.
    pub arxiv_id: Option<String>,

    /// Verbatim text of page 1, used as a free-text query fallback.
    pub first_page_text: String,
}

impl ExtractedIdentifiers {
    /// True when neither identifier nor usable text was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doi.is_none() && self.arxiv_id.is_none() && self.first_page_text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_optional_fields_only_when_present() {
        let meta = PaperMetadata {
            doi: "10.1234/x".to_string(),
            title: "A Paper".to_string(),
            authors: vec!["Ada Lovelace".to_string()],
            ..PaperMetadata::default()
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["doi"], "10.1234/x");
        assert!(json.get("journal").is_none());
        assert!(json.get("abstract").is_none());
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_metadata_abstract_rename() {
        let meta = PaperMetadata {
            doi: String::new(),
            title: "T".to_string(),
            authors: vec![],
            abstract_text: Some("sum".to_string()),
            ..PaperMetadata::default()
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["abstract"], "sum");
        assert!(json.get("abstract_text").is_none());
    }

    #[test]
    fn test_extracted_identifiers_is_empty() {
        assert!(ExtractedIdentifiers::default().is_empty());
        assert!(
            ExtractedIdentifiers { first_page_text: "  \n".to_string(), ..Default::default() }
                .is_empty()
        );
        assert!(
            !ExtractedIdentifiers { doi: Some("10.1/x".to_string()), ..Default::default() }
                .is_empty()
        );
    }
}
