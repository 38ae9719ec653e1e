//! HTTP error mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::ValidationError;
use crate::CardioriskError;

/// An error returned to clients as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<CardioriskError> for ApiError {
    fn from(err: CardioriskError) -> Self {
        match err {
            CardioriskError::Validation(e) => {
                tracing::warn!("Rejected request: {}", e);
                Self::new(StatusCode::BAD_REQUEST, e.to_string())
            }
            CardioriskError::ModelNotLoaded(msg) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Model not loaded. {msg}"),
            ),
            CardioriskError::Artifact(e) => {
                tracing::error!("Model artifacts unavailable: {}", e);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Model unavailable")
            }
            other => {
                tracing::error!("Request failed: {}", other);
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::MalformedBody(rejection.body_text()).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CardioriskError::from(err).into()
    }
}
