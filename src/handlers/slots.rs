use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::scheduling;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub staff_id: String,
    pub service_id: String,
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<NaiveDateTime>,
}

// GET /api/shops/:shop_id/available-slots?staff_id=..&service_id=..&date=YYYY-MM-DD
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Path(shop_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let slots = scheduling::available_slots(
        &state,
        &shop_id,
        &query.staff_id,
        &query.service_id,
        query.date,
        Utc::now(),
    )?;
    Ok(Json(SlotsResponse {
        date: query.date,
        slots,
    }))
}
