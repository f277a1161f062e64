//! HTTP error responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::documents::DocumentError;

/// Body of the 413 reply for uploads over the configured limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "File is too large.";

/// Errors returned by route handlers, rendered as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload could not be accepted or stored.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The multipart body could not be read.
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    /// The request body exceeded the upload limit.
    #[error("request body over the upload limit")]
    PayloadTooLarge,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Document(DocumentError::Pdf(_)) => (
                StatusCode::BAD_REQUEST,
                DocumentError::NoReadableText.to_string(),
            ),
            Self::Document(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Document(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store the document.".to_string(),
            ),
            Self::Multipart(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => (
                StatusCode::PAYLOAD_TOO_LARGE,
                PAYLOAD_TOO_LARGE_MESSAGE.to_string(),
            ),
            Self::Multipart(err) => (err.status(), err.body_text()),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                PAYLOAD_TOO_LARGE_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            warn!("Rejected request: {self}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
