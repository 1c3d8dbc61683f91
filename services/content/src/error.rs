use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Errors raised by the storage collaborator (Postgres)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Errors raised while aggregating ratings or composing previews.
///
/// An empty rating set is not an error; it resolves to the default rating.
#[derive(Error, Debug)]
pub enum RatingError {
    #[error("rating storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),
}

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("upload failed: {0}")]
    Upload(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::StorageUnavailable(err)
    }
}

impl From<RatingError> for ServiceError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::StorageUnavailable(e) => ServiceError::StorageUnavailable(e),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Upload(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Upload(_) => "UPLOAD_FAILED",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage details stay in the logs, not in the response
        let message = match &self {
            ServiceError::StorageUnavailable(e) => {
                error!(error = %e, "Storage call failed");
                "Unexpected error from database".to_string()
            }
            ServiceError::Upload(e) => {
                error!(error = %e, "Image upload failed");
                "Update failed".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: self.code().to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_error_maps_to_storage_unavailable() {
        let err: ServiceError =
            RatingError::StorageUnavailable(StoreError::Timeout(Duration::from_secs(2))).into();

        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "STORAGE_UNAVAILABLE");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::NotFound("Content not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Upload("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
