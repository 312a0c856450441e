use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;

use super::check_auth;
use crate::db;
use crate::errors::AppError;
use crate::models::{Service, Shop, Staff};
use crate::services::catalog::{self, NewService, NewShop, NewStaff, ShopUpdate, StaffUpdate};
use crate::state::AppState;

// POST /api/shops
pub async fn create_shop(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewShop>,
) -> Result<(StatusCode, Json<Shop>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    let shop = catalog::create_shop(&conn, body, Utc::now().naive_utc())?;
    Ok((StatusCode::CREATED, Json(shop)))
}

// GET /api/shops/:shop_id
pub async fn get_shop(
    State(state): State<Arc<AppState>>,
    Path(shop_id): Path<String>,
) -> Result<Json<Shop>, AppError> {
    let conn = db::lock(&state.db);
    Ok(Json(catalog::get_shop(&conn, &shop_id)?))
}

// PUT /api/shops/:shop_id
pub async fn update_shop(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(shop_id): Path<String>,
    Json(body): Json<ShopUpdate>,
) -> Result<Json<Shop>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    Ok(Json(catalog::update_shop(
        &conn,
        &shop_id,
        body,
        Utc::now().naive_utc(),
    )?))
}

// DELETE /api/shops/:shop_id
pub async fn delete_shop(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(shop_id): Path<String>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    catalog::deactivate_shop(&conn, &shop_id, Utc::now().naive_utc())?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/shops/:shop_id/staff
pub async fn add_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(shop_id): Path<String>,
    Json(body): Json<NewStaff>,
) -> Result<(StatusCode, Json<Staff>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    let staff = catalog::add_staff(&conn, &shop_id, body, Utc::now().naive_utc())?;
    Ok((StatusCode::CREATED, Json(staff)))
}

// GET /api/shops/:shop_id/staff
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<Staff>>, AppError> {
    let conn = db::lock(&state.db);
    Ok(Json(catalog::list_staff(&conn, &shop_id)?))
}

// PUT /api/staff/:staff_id
pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
    Json(body): Json<StaffUpdate>,
) -> Result<Json<Staff>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    Ok(Json(catalog::update_staff(
        &conn,
        &staff_id,
        body,
        Utc::now().naive_utc(),
    )?))
}

// DELETE /api/staff/:staff_id
pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    catalog::deactivate_staff(&conn, &staff_id, Utc::now().naive_utc())?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/shops/:shop_id/services
pub async fn add_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(shop_id): Path<String>,
    Json(body): Json<NewService>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    let service = catalog::add_service(&conn, &shop_id, body, Utc::now().naive_utc())?;
    Ok((StatusCode::CREATED, Json(service)))
}

// GET /api/shops/:shop_id/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<Service>>, AppError> {
    let conn = db::lock(&state.db);
    Ok(Json(catalog::list_services(&conn, &shop_id)?))
}

// DELETE /api/services/:service_id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(service_id): Path<String>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let conn = db::lock(&state.db);
    catalog::deactivate_service(&conn, &service_id, Utc::now().naive_utc())?;
    Ok(StatusCode::NO_CONTENT)
}
