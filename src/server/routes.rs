//! HTTP route handlers for the Jarvis API.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::documents::DocumentError;

use super::error::ApiError;
use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/upload", post(upload))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(map_response(json_payload_too_large))
        .with_state(state)
}

/// Give the body limit's plain-text 413 the same `{"error"}` shape as other failures.
async fn json_payload_too_large(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge.into_response()
    } else {
        response
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "jarvis-agent",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message; absent and `null` both count as empty.
    #[serde(default)]
    pub message: Option<String>,
    /// Acting user; the configured default when absent.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply or a fallback message.
    pub response: String,
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Confirmation shown to the user.
    pub message: String,
}

/// Handle a chat turn. Always answers 200; failures become fallback text.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = state
        .assistant
        .chat(
            request.user_id.as_deref(),
            request.message.as_deref().unwrap_or_default(),
        )
        .await;
    Json(ChatResponse {
        response: reply.response,
    })
}

/// Handle a multipart upload with a `file` part and an optional `user_id`.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("user_id") => user_id = Some(field.text().await?),
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (file_name, bytes) = file.ok_or(DocumentError::NoFile)?;
    state
        .assistant
        .upload(user_id.as_deref(), &file_name, bytes)
        .await?;

    Ok(Json(UploadResponse {
        message: format!("✅ File '{file_name}' uploaded successfully!"),
    }))
}
