//! HTTP route handlers.
//!
//! Three surfaces: metadata lookup (by parameters or by uploaded PDF), the
//! model catalog listing, and the streamed document chat. Error bodies are
//! always `{ "error": ... }` with the status from [`ApiError`].

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use crate::catalog::LookupRequest;
use crate::error::{ApiError, ApiResult, SourceError};
use crate::extract;
use crate::llm::{ChatRequest, transcode};
use crate::models::{ChatTurn, ModelEntry, PaperMetadata, Provider};

/// Uploads above this size are rejected outright.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/metadata", get(lookup_metadata).post(metadata_from_file))
        .route("/api/models", get(list_models))
        .route("/api/chat", post(chat))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "paperlens",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct MetadataQuery {
    doi: Option<String>,
    arxiv: Option<String>,
    query: Option<String>,
}

/// `GET /api/metadata` — resolve by explicit identifiers or free text.
async fn lookup_metadata(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetadataQuery>,
) -> ApiResult<Json<PaperMetadata>> {
    if params.doi.is_none() && params.arxiv.is_none() && params.query.is_none() {
        return Err(ApiError::bad_request("Provide a 'doi', 'arxiv', or 'query' parameter."));
    }

    let request =
        LookupRequest { doi: params.doi, arxiv_id: params.arxiv, query: params.query };

    state.resolver.resolve(&request).await.map(Json).ok_or(ApiError::NotFound)
}

/// `POST /api/metadata` — extract identifiers from an uploaded PDF, then
/// resolve through the same chain.
async fn metadata_from_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<PaperMetadata>> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("file") {
            upload = Some(read_upload(field).await?);
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("A PDF file is required."))?;
    upload.ensure_pdf()?;

    let identifiers = extract::extract_identifiers(&upload.bytes, &upload.file_name);
    tracing::debug!(
        doi = ?identifiers.doi,
        arxiv = ?identifiers.arxiv_id,
        "identifiers extracted from upload"
    );

    let request = LookupRequest {
        doi: identifiers.doi,
        arxiv_id: identifiers.arxiv_id,
        query: Some(identifiers.first_page_text),
    };

    state.resolver.resolve(&request).await.map(Json).ok_or(ApiError::NotFound)
}

/// `GET /api/models` — the cached model listing.
async fn list_models(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ModelEntry>>> {
    state.models.models().await.map(Json).map_err(|err| match err {
        SourceError::Status { .. } => {
            ApiError::upstream("OpenRouter", "failed to fetch model list")
        }
        other => ApiError::Internal(format!("Failed to fetch models: {other}")),
    })
}

/// `POST /api/chat` — stream a completion about the uploaded document.
///
/// The response body is newline-delimited JSON events; client disconnect
/// drops the body stream, which aborts the upstream request.
async fn chat(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut upload: Option<Upload> = None;
    let mut prompt: Option<String> = None;
    let mut provider = Provider::default();
    let mut model_id = "ollama".to_string();
    let mut history: Vec<ChatTurn> = Vec::new();
    let mut selection: Option<String> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name().unwrap_or_default() {
            "file" => upload = Some(read_upload(field).await?),
            "prompt" => prompt = Some(field_text(field).await?),
            "provider" => provider = Provider::parse(&field_text(field).await?),
            "model" => model_id = field_text(field).await?,
            // Tolerate malformed history rather than failing the request.
            "history" => {
                history = serde_json::from_str(&field_text(field).await?).unwrap_or_default();
            }
            "selection" => selection = Some(field_text(field).await?),
            _ => {}
        }
    }

    let (Some(upload), Some(prompt)) = (upload, prompt.filter(|p| !p.is_empty())) else {
        return Err(ApiError::bad_request("Both a PDF file and a prompt are required."));
    };
    upload.ensure_pdf()?;
    state.proxy.ensure_configured(provider)?;

    let paper_text = extract::extract_full_text(&upload.bytes)
        .map_err(|err| ApiError::Internal(format!("Failed to process the paper: {err}")))?;
    if paper_text.trim().is_empty() {
        return Err(ApiError::Unprocessable("Could not extract text from the PDF.".to_string()));
    }

    let request =
        ChatRequest { provider, model_id, prompt, selection, paper_text, history };
    let upstream = state.proxy.stream_completion(&request).await?;

    let body = Body::from_stream(transcode(upstream.bytes_stream()));
    Response::builder()
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// An uploaded file field.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

impl Upload {
    fn ensure_pdf(&self) -> ApiResult<()> {
        if self.content_type.as_deref() != Some("application/pdf") {
            return Err(ApiError::bad_request("Only PDF files are accepted."));
        }
        Ok(())
    }
}

async fn next_field(
    multipart: &mut Multipart,
) -> ApiResult<Option<axum::extract::multipart::Field<'_>>> {
    multipart.next_field().await.map_err(|err| ApiError::bad_request(err.to_string()))
}

async fn read_upload(field: axum::extract::multipart::Field<'_>) -> ApiResult<Upload> {
    let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes =
        field.bytes().await.map_err(|err| ApiError::bad_request(err.to_string()))?;

    Ok(Upload { file_name, content_type, bytes })
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field.text().await.map_err(|err| ApiError::bad_request(err.to_string()))
}
