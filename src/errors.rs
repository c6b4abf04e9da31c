use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::availability::AvailabilityError;
use crate::services::booking::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),
}

impl From<AvailabilityError> for AppError {
    fn from(e: AvailabilityError) -> Self {
        match e {
            AvailabilityError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
            AvailabilityError::DataIntegrity(_) => AppError::Internal(e.into()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
            BookingError::DurationExceeded { .. } => AppError::Unprocessable(e.to_string()),
            BookingError::SlotUnavailable | BookingError::Conflict => {
                AppError::Conflict(e.to_string())
            }
            BookingError::Availability(inner) => inner.into(),
            BookingError::Storage(inner) => AppError::Internal(inner),
        }
    }
}

/// Wraps a storage failure, turning SQLite constraint violations into conflicts.
pub fn storage_error(e: anyhow::Error, conflict_message: &str) -> AppError {
    let constraint = e
        .downcast_ref::<rusqlite::Error>()
        .and_then(|err| err.sqlite_error_code())
        == Some(rusqlite::ErrorCode::ConstraintViolation);
    if constraint {
        AppError::Conflict(conflict_message.to_string())
    } else {
        AppError::Internal(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Messaging(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
