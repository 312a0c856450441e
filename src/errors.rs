use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

/// Conditions raised by the scheduling core.
///
/// Only `Busy` and `SlotConflict` are worth retrying automatically, and only
/// after the caller has refetched the available slots.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not eligible: {0}")]
    NotEligible(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("the requested time is not an available slot, please pick another one")]
    SlotUnavailable,

    #[error("that slot was just taken by another booking, please pick another one")]
    SlotConflict,

    #[error("invalid status transition from {from} to {to}")]
    InvalidStateTransition { from: BookingStatus, to: BookingStatus },

    #[error("staff calendar is busy, try again")]
    Busy,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl SchedulingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulingError::Busy | SchedulingError::SlotConflict)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulingError::NotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SchedulingError::SlotUnavailable => StatusCode::CONFLICT,
            SchedulingError::SlotConflict => StatusCode::CONFLICT,
            SchedulingError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            SchedulingError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            SchedulingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, retryable) = match &self {
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, false),
            AppError::Scheduling(e) => (e.status_code(), e.is_retryable()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, false),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, false),
            AppError::Forbidden => (StatusCode::FORBIDDEN, false),
        };

        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string(), "retryable": retryable });
        (status, axum::Json(body)).into_response()
    }
}
