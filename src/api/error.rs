use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors returned to HTTP clients as `{"error": ..., "detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("match not found")]
    MatchNotFound { id: String },

    #[error("invalid parameter")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MatchNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::MatchNotFound { id } => format!("no match with id '{id}'"),
            Self::InvalidParameter { name, reason } => format!("{name}: {reason}"),
        };
        let body = json!({ "error": self.to_string(), "detail": detail });
        (self.status(), Json(body)).into_response()
    }
}
