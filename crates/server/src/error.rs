//! API error type and its JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nodes::TriggerError;
use pipeline::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler, rendered as
/// `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 409, a pipeline run is already in flight
    #[error("{0}")]
    Conflict(String),

    /// 500
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::InvalidName { .. } => Self::BadRequest("Invalid filename".to_string()),
            StoreError::Locked { .. } => Self::Conflict(err.to_string()),
            StoreError::Io { .. } | StoreError::Corrupt { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::AlreadyRunning => Self::Conflict(err.to_string()),
            TriggerError::Status(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_statuses() {
        let locked = ApiError::from(StoreError::Locked {
            artifact: "pipeline_status.json".to_string(),
        });
        assert_eq!(locked.into_response().status(), StatusCode::CONFLICT);

        let missing = ApiError::from(StoreError::NotFound {
            artifact: "quarterly_shift.json".to_string(),
        });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(StoreError::InvalidName {
            name: "../x".to_string(),
        });
        assert_eq!(invalid.to_string(), "Invalid filename");
    }
}
