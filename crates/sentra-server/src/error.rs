//! Server error type
//!
//! Wraps the engine taxonomy and maps it onto HTTP status codes with a
//! stable machine-readable code in the JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sentra_core::CoreError;
use serde_json::json;

/// Server error
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CoreError::Cancelled(_) => StatusCode::REQUEST_TIMEOUT,
            CoreError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
