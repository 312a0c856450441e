//! Shop-owner management of shops, staff and services.
//!
//! Nothing is ever hard-deleted: "delete" flips the active flag so bookings
//! keep pointing at a real row.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::SchedulingError;
use crate::models::{
    BusinessHours, Service, ServiceCategory, Shop, ShopSettings, Staff, StaffAvailability,
};

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

fn invalid(msg: impl Into<String>) -> SchedulingError {
    SchedulingError::InvalidRequest(msg.into())
}

fn require_name(name: &str) -> Result<(), SchedulingError> {
    if name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    Ok(())
}

fn validate_offset(minutes: i32) -> Result<(), SchedulingError> {
    if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(invalid(format!("utc offset {minutes} is out of range")));
    }
    Ok(())
}

// ── Shops ──

#[derive(Debug, Deserialize)]
pub struct NewShop {
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub business_hours: BusinessHours,
    #[serde(default)]
    pub settings: ShopSettings,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub business_hours: Option<BusinessHours>,
    pub settings: Option<ShopSettings>,
    pub utc_offset_minutes: Option<i32>,
    pub active: Option<bool>,
}

pub fn create_shop(
    conn: &Connection,
    input: NewShop,
    now: NaiveDateTime,
) -> Result<Shop, SchedulingError> {
    require_name(&input.name)?;
    input.settings.validate().map_err(invalid)?;
    validate_offset(input.utc_offset_minutes)?;

    let shop = Shop {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: input.owner_id,
        name: input.name,
        address: input.address,
        phone: input.phone,
        business_hours: input.business_hours,
        settings: input.settings,
        utc_offset_minutes: input.utc_offset_minutes,
        active: true,
        created_at: now,
        updated_at: now,
    };
    queries::insert_shop(conn, &shop)?;
    tracing::info!(shop_id = %shop.id, "shop created");
    Ok(shop)
}

pub fn get_shop(conn: &Connection, shop_id: &str) -> Result<Shop, SchedulingError> {
    queries::get_shop(conn, shop_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("shop {shop_id}")))
}

pub fn update_shop(
    conn: &Connection,
    shop_id: &str,
    update: ShopUpdate,
    now: NaiveDateTime,
) -> Result<Shop, SchedulingError> {
    let mut shop = get_shop(conn, shop_id)?;

    if let Some(name) = update.name {
        require_name(&name)?;
        shop.name = name;
    }
    if let Some(address) = update.address {
        shop.address = address;
    }
    if let Some(phone) = update.phone {
        shop.phone = phone;
    }
    if let Some(hours) = update.business_hours {
        shop.business_hours = hours;
    }
    if let Some(settings) = update.settings {
        settings.validate().map_err(invalid)?;
        shop.settings = settings;
    }
    if let Some(offset) = update.utc_offset_minutes {
        validate_offset(offset)?;
        shop.utc_offset_minutes = offset;
    }
    if let Some(active) = update.active {
        shop.active = active;
    }
    shop.updated_at = now;

    queries::update_shop(conn, &shop)?;
    Ok(shop)
}

pub fn deactivate_shop(
    conn: &Connection,
    shop_id: &str,
    now: NaiveDateTime,
) -> Result<Shop, SchedulingError> {
    let update = ShopUpdate {
        active: Some(false),
        ..ShopUpdate::default()
    };
    let shop = update_shop(conn, shop_id, update, now)?;
    tracing::info!(shop_id, "shop deactivated");
    Ok(shop)
}

// ── Staff ──

#[derive(Debug, Deserialize)]
pub struct NewStaff {
    pub name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub availability: StaffAvailability,
    #[serde(default)]
    pub service_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub availability: Option<StaffAvailability>,
    pub service_ids: Option<Vec<String>>,
    pub active: Option<bool>,
}

/// Every offered service must exist and belong to `shop_id`.
fn check_service_ids(
    conn: &Connection,
    shop_id: &str,
    service_ids: &[String],
) -> Result<(), SchedulingError> {
    for id in service_ids {
        match queries::get_service(conn, id)? {
            Some(service) if service.shop_id == shop_id => {}
            Some(_) => return Err(invalid(format!("service {id} belongs to another shop"))),
            None => return Err(SchedulingError::NotFound(format!("service {id}"))),
        }
    }
    Ok(())
}

pub fn add_staff(
    conn: &Connection,
    shop_id: &str,
    input: NewStaff,
    now: NaiveDateTime,
) -> Result<Staff, SchedulingError> {
    get_shop(conn, shop_id)?;
    require_name(&input.name)?;
    input
        .availability
        .validate()
        .map_err(|e| invalid(format!("{e:#}")))?;
    check_service_ids(conn, shop_id, &input.service_ids)?;

    let staff = Staff {
        id: uuid::Uuid::new_v4().to_string(),
        shop_id: shop_id.to_string(),
        name: input.name,
        phone: input.phone,
        availability: input.availability,
        service_ids: input.service_ids,
        active: true,
        created_at: now,
        updated_at: now,
    };
    queries::insert_staff(conn, &staff)?;
    tracing::info!(shop_id, staff_id = %staff.id, "staff added");
    Ok(staff)
}

pub fn get_staff(conn: &Connection, staff_id: &str) -> Result<Staff, SchedulingError> {
    queries::get_staff(conn, staff_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("staff {staff_id}")))
}

pub fn update_staff(
    conn: &Connection,
    staff_id: &str,
    update: StaffUpdate,
    now: NaiveDateTime,
) -> Result<Staff, SchedulingError> {
    let mut staff = get_staff(conn, staff_id)?;

    if let Some(name) = update.name {
        require_name(&name)?;
        staff.name = name;
    }
    if let Some(phone) = update.phone {
        staff.phone = Some(phone);
    }
    if let Some(availability) = update.availability {
        availability
            .validate()
            .map_err(|e| invalid(format!("{e:#}")))?;
        staff.availability = availability;
    }
    if let Some(service_ids) = update.service_ids {
        check_service_ids(conn, &staff.shop_id, &service_ids)?;
        staff.service_ids = service_ids;
    }
    if let Some(active) = update.active {
        staff.active = active;
    }
    staff.updated_at = now;

    queries::update_staff(conn, &staff)?;
    Ok(staff)
}

pub fn deactivate_staff(
    conn: &Connection,
    staff_id: &str,
    now: NaiveDateTime,
) -> Result<Staff, SchedulingError> {
    let update = StaffUpdate {
        active: Some(false),
        ..StaffUpdate::default()
    };
    let staff = update_staff(conn, staff_id, update, now)?;
    tracing::info!(staff_id, "staff deactivated");
    Ok(staff)
}

pub fn list_staff(conn: &Connection, shop_id: &str) -> Result<Vec<Staff>, SchedulingError> {
    get_shop(conn, shop_id)?;
    Ok(queries::list_staff_for_shop(conn, shop_id)?)
}

// ── Services ──

#[derive(Debug, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category: ServiceCategory,
    pub duration_minutes: u32,
    /// Falls back to the shop's default buffer.
    pub buffer_time_minutes: Option<u32>,
    pub price: Decimal,
}

pub fn add_service(
    conn: &Connection,
    shop_id: &str,
    input: NewService,
    now: NaiveDateTime,
) -> Result<Service, SchedulingError> {
    let shop = get_shop(conn, shop_id)?;
    require_name(&input.name)?;
    if input.duration_minutes == 0 {
        return Err(invalid("service duration must be positive"));
    }
    let buffer_time_minutes = input
        .buffer_time_minutes
        .unwrap_or(shop.settings.buffer_time_minutes);
    let occupied = input.duration_minutes.checked_add(buffer_time_minutes);
    if occupied.map_or(true, |m| m > Service::MAX_OCCUPIED_MINUTES) {
        return Err(invalid(format!(
            "duration plus buffer must be at most {} minutes",
            Service::MAX_OCCUPIED_MINUTES
        )));
    }
    if input.price.is_sign_negative() {
        return Err(invalid("price must not be negative"));
    }

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        shop_id: shop_id.to_string(),
        name: input.name,
        description: input.description,
        category: input.category,
        duration_minutes: input.duration_minutes,
        buffer_time_minutes,
        price: input.price,
        active: true,
        created_at: now,
        updated_at: now,
    };
    queries::insert_service(conn, &service)?;
    tracing::info!(shop_id, service_id = %service.id, "service added");
    Ok(service)
}

pub fn deactivate_service(
    conn: &Connection,
    service_id: &str,
    now: NaiveDateTime,
) -> Result<(), SchedulingError> {
    if !queries::set_service_active(conn, service_id, false, &now)? {
        return Err(SchedulingError::NotFound(format!("service {service_id}")));
    }
    tracing::info!(service_id, "service deactivated");
    Ok(())
}

pub fn list_services(conn: &Connection, shop_id: &str) -> Result<Vec<Service>, SchedulingError> {
    get_shop(conn, shop_id)?;
    Ok(queries::list_services_for_shop(conn, shop_id)?)
}
