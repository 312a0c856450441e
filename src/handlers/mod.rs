pub mod bookings;
pub mod calendar;
pub mod catalog;
pub mod health;
pub mod payments;
pub mod slots;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::Booking;

pub const USER_HEADER: &str = "x-user-id";

/// Who is calling: the shop owner (admin bearer token) or a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Admin,
    User(String),
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap, admin_token: &str) -> Result<Self, AppError> {
        if check_auth(headers, admin_token).is_ok() {
            return Ok(Caller::Admin);
        }
        user_id(headers).map(Caller::User)
    }

    pub fn can_access(&self, booking: &Booking) -> bool {
        match self {
            Caller::Admin => true,
            Caller::User(id) => *id == booking.user_id,
        }
    }
}

pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn user_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}
