// Modified: 2026-03-14

//! API error mapping.
//!
//! Every error carries a stable machine-readable kind and a human
//! message; conflicts surface the existing resource's id and degraded
//! states are explicit rather than masked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use privguard_core::Error;

/// Wrapper carrying the core error into an HTTP response
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
            "status": status.as_u16(),
        });
        if let Error::Conflict {
            existing_id: Some(id),
            ..
        } = &self.0
        {
            body["existing_id"] = serde_json::json!(id);
        }

        (status, Json(body)).into_response()
    }
}

/// Handler result alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;
