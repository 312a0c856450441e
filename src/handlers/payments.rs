use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use super::check_auth;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::lifecycle::PaymentEvent;
use crate::services::scheduling;
use crate::state::AppState;

// POST /api/payments/:booking_id/:event
pub async fn payment_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((booking_id, event)): Path<(String, String)>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let event = match event.as_str() {
        "started" => PaymentEvent::Started,
        "completed" => PaymentEvent::Completed,
        "failed" => PaymentEvent::Failed,
        "refunded" => PaymentEvent::Refunded,
        other => return Err(AppError::BadRequest(format!("unknown payment event: {other}"))),
    };

    let booking = scheduling::payment_event(&state, &booking_id, event, Utc::now())?;
    Ok(Json(booking))
}
