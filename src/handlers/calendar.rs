use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::{self, queries};
use crate::errors::{AppError, SchedulingError};
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /calendar/:booking_id
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    // Strip .ics suffix if present
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let (booking, shop_name, service_name) = {
        let conn = db::lock(&state.db);
        let booking = queries::get_booking_by_id(&conn, booking_id)?
            .ok_or_else(|| SchedulingError::NotFound(format!("booking {booking_id}")))?;
        let shop_name = queries::get_shop(&conn, &booking.shop_id)?
            .map(|s| s.name)
            .unwrap_or_else(|| "Barbershop".to_string());
        let service_name = queries::get_service(&conn, &booking.service_id)?
            .map(|s| s.name)
            .unwrap_or_else(|| "Appointment".to_string());
        (booking, shop_name, service_name)
    };

    let ics = generate_ics(&booking, &shop_name, &service_name);
    let filename = format!("booking-{booking_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
