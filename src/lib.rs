pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // catalog
        .route("/api/shops", post(handlers::catalog::create_shop))
        .route(
            "/api/shops/:shop_id",
            get(handlers::catalog::get_shop)
                .put(handlers::catalog::update_shop)
                .delete(handlers::catalog::delete_shop),
        )
        .route(
            "/api/shops/:shop_id/staff",
            post(handlers::catalog::add_staff).get(handlers::catalog::list_staff),
        )
        .route(
            "/api/staff/:staff_id",
            put(handlers::catalog::update_staff).delete(handlers::catalog::delete_staff),
        )
        .route(
            "/api/shops/:shop_id/services",
            post(handlers::catalog::add_service).get(handlers::catalog::list_services),
        )
        .route(
            "/api/services/:service_id",
            axum::routing::delete(handlers::catalog::delete_service),
        )
        // scheduling
        .route(
            "/api/shops/:shop_id/available-slots",
            get(handlers::slots::available_slots),
        )
        .route(
            "/api/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::my_bookings),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/cancel",
            put(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/status",
            put(handlers::bookings::update_status),
        )
        .route(
            "/api/bookings/:id/reschedule",
            put(handlers::bookings::reschedule_booking),
        )
        .route(
            "/api/shops/:shop_id/bookings",
            get(handlers::bookings::shop_bookings),
        )
        .route(
            "/api/staff/:staff_id/bookings",
            get(handlers::bookings::staff_bookings),
        )
        .route(
            "/api/payments/:booking_id/:event",
            post(handlers::payments::payment_callback),
        )
        .route(
            "/calendar/:booking_id",
            get(handlers::calendar::download_ics),
        )
        .with_state(state)
}
