use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No export exists for the requested week. The data is generated
    /// offline, so retrying will not help.
    #[error("GeoJSON not found for week {week}")]
    NotFound { week: String },
    #[error("prediction store unavailable")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Store(e) => {
                tracing::error!(error = ?e, "prediction store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
