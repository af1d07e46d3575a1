//! Error types for the metadata and chat services.
//!
//! Two layers, mirroring the failure taxonomy:
//! - [`SourceError`]: one catalog attempt failed. The resolver collapses
//!   these to "this source has nothing" and moves on; they never cross the
//!   HTTP boundary.
//! - [`ApiError`]: a caller-visible failure with a definite status code and
//!   a `{ "error": ... }` JSON body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of a single external-catalog attempt.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// HTTP transport error (connection, DNS, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the catalog.
    #[error("unexpected status {status}")]
    Status {
        /// HTTP status code returned.
        status: u16,
    },

    /// Response body did not match the expected schema.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The catalog answered but holds no usable record.
    #[error("no record found")]
    NotFound,
}

impl SourceError {
    /// Create a status error from a response code.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self::Status { status }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Caller-visible request failure.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Malformed or incomplete request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Every applicable source was tried and none produced a record (404).
    #[error("No metadata found.")]
    NotFound,

    /// The document was accepted but yielded no usable text (422).
    #[error("{0}")]
    Unprocessable(String),

    /// Server-side configuration is missing for the selected provider (500).
    #[error("{0}")]
    Config(String),

    /// Unclassified internal failure (500).
    #[error("{0}")]
    Internal(String),

    /// The completion backend rejected the request or returned no body (502).
    #[error("{label} error: {message}")]
    Upstream {
        /// Provider label ("Ollama" / "OpenRouter").
        label: &'static str,
        /// Raw error text from the backend.
        message: String,
    },
}

impl ApiError {
    /// Create a bad-request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an upstream error carrying the backend's raw error text.
    #[must_use]
    pub fn upstream(label: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream { label, message: message.into() }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type alias for catalog operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Unprocessable("x".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Config("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::upstream("Ollama", "boom").status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_message_embeds_raw_text() {
        let err = ApiError::upstream("OpenRouter", "model not found");
        assert_eq!(err.to_string(), "OpenRouter error: model not found");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::NotFound.to_string(), "No metadata found.");
    }
}
