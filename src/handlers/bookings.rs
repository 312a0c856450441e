use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

use super::{check_auth, user_id, Caller};
use crate::db::queries::BookingOwner;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::scheduling::{self, BookingRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub shop_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub appointment_date_time: NaiveDateTime,
    pub notes: Option<String>,
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let user_id = user_id(&headers)?;
    let request = BookingRequest {
        shop_id: body.shop_id,
        staff_id: body.staff_id,
        service_id: body.service_id,
        user_id,
        appointment_date_time: body.appointment_date_time,
        notes: body.notes.filter(|n| !n.trim().is_empty()),
    };
    let booking = scheduling::create_booking(&state, request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

// GET /api/bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let user_id = user_id(&headers)?;
    let bookings =
        scheduling::list_bookings(&state, BookingOwner::User(&user_id), range.from, range.to)?;
    Ok(Json(bookings))
}

// GET /api/shops/:shop_id/bookings
pub async fn shop_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(shop_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let bookings =
        scheduling::list_bookings(&state, BookingOwner::Shop(&shop_id), range.from, range.to)?;
    Ok(Json(bookings))
}

// GET /api/staff/:staff_id/bookings
pub async fn staff_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let bookings =
        scheduling::list_bookings(&state, BookingOwner::Staff(&staff_id), range.from, range.to)?;
    Ok(Json(bookings))
}

/// Loads the booking and checks the caller may act on it.
fn authorize(state: &AppState, headers: &HeaderMap, booking_id: &str) -> Result<Booking, AppError> {
    let caller = Caller::from_headers(headers, &state.config.admin_token)?;
    let booking = scheduling::get_booking(state, booking_id)?;
    if !caller.can_access(&booking) {
        return Err(AppError::Forbidden);
    }
    Ok(booking)
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(authorize(&state, &headers, &id)?))
}

#[derive(Deserialize, Default)]
pub struct CancelBody {
    pub reason: Option<String>,
}

// PUT /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<Booking>, AppError> {
    authorize(&state, &headers, &id)?;
    let reason = body
        .and_then(|Json(b)| b.reason)
        .filter(|r| !r.trim().is_empty());
    let booking = scheduling::cancel_booking(&state, &id, reason, Utc::now())?;
    Ok(Json(booking))
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: BookingStatus,
}

// PUT /api/bookings/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let booking = scheduling::update_status(&state, &id, body.status, Utc::now())?;
    Ok(Json(booking))
}

#[derive(Deserialize)]
pub struct RescheduleBody {
    pub appointment_date_time: NaiveDateTime,
}

// PUT /api/bookings/:id/reschedule
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<Booking>, AppError> {
    authorize(&state, &headers, &id)?;
    let booking =
        scheduling::reschedule_booking(&state, &id, body.appointment_date_time, Utc::now()).await?;
    Ok(Json(booking))
}
