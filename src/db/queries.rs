use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, BusinessHours, Interval, PaymentStatus, Service, ServiceCategory,
    Shop, ShopSettings, Staff, StaffAvailability,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).with_context(|| format!("bad timestamp: {s}"))
}

// ── Shops ──

const SHOP_COLUMNS: &str = "id, owner_id, name, address, phone, business_hours, settings, utc_offset_minutes, active, created_at, updated_at";

pub fn insert_shop(conn: &Connection, shop: &Shop) -> anyhow::Result<()> {
    conn.execute(
        &format!("INSERT INTO shops ({SHOP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
        params![
            shop.id,
            shop.owner_id,
            shop.name,
            shop.address,
            shop.phone,
            serde_json::to_string(&shop.business_hours)?,
            serde_json::to_string(&shop.settings)?,
            shop.utc_offset_minutes,
            shop.active,
            fmt_ts(&shop.created_at),
            fmt_ts(&shop.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_shop(conn: &Connection, shop: &Shop) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE shops SET name = ?2, address = ?3, phone = ?4, business_hours = ?5, settings = ?6,
                utc_offset_minutes = ?7, active = ?8, updated_at = ?9
         WHERE id = ?1",
        params![
            shop.id,
            shop.name,
            shop.address,
            shop.phone,
            serde_json::to_string(&shop.business_hours)?,
            serde_json::to_string(&shop.settings)?,
            shop.utc_offset_minutes,
            shop.active,
            fmt_ts(&shop.updated_at),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_shop(conn: &Connection, id: &str) -> anyhow::Result<Option<Shop>> {
    let result = conn
        .query_row(
            &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?1"),
            params![id],
            |row| Ok(parse_shop_row(row)),
        )
        .optional()?;
    result.transpose()
}

fn parse_shop_row(row: &rusqlite::Row) -> anyhow::Result<Shop> {
    let business_hours: String = row.get(5)?;
    let settings: String = row.get(6)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Shop {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        business_hours: BusinessHours::from_json(&business_hours)?,
        settings: serde_json::from_str::<ShopSettings>(&settings)?,
        utc_offset_minutes: row.get(7)?,
        active: row.get(8)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Staff ──

const STAFF_COLUMNS: &str =
    "id, shop_id, name, phone, availability, service_ids, active, created_at, updated_at";

pub fn insert_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<()> {
    conn.execute(
        &format!("INSERT INTO staff ({STAFF_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            staff.id,
            staff.shop_id,
            staff.name,
            staff.phone,
            serde_json::to_string(&staff.availability)?,
            serde_json::to_string(&staff.service_ids)?,
            staff.active,
            fmt_ts(&staff.created_at),
            fmt_ts(&staff.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE staff SET name = ?2, phone = ?3, availability = ?4, service_ids = ?5, active = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            staff.id,
            staff.name,
            staff.phone,
            serde_json::to_string(&staff.availability)?,
            serde_json::to_string(&staff.service_ids)?,
            staff.active,
            fmt_ts(&staff.updated_at),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_staff(conn: &Connection, id: &str) -> anyhow::Result<Option<Staff>> {
    let result = conn
        .query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
            params![id],
            |row| Ok(parse_staff_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn list_staff_for_shop(conn: &Connection, shop_id: &str) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff WHERE shop_id = ?1 AND active = 1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![shop_id], |row| Ok(parse_staff_row(row)))?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row??);
    }
    Ok(staff)
}

fn parse_staff_row(row: &rusqlite::Row) -> anyhow::Result<Staff> {
    let availability: String = row.get(4)?;
    let service_ids: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Staff {
        id: row.get(0)?,
        shop_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        availability: StaffAvailability::from_json(&availability)?,
        service_ids: serde_json::from_str(&service_ids)?,
        active: row.get(6)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Services ──

const SERVICE_COLUMNS: &str = "id, shop_id, name, description, category, duration_minutes, buffer_time_minutes, price, active, created_at, updated_at";

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        &format!("INSERT INTO services ({SERVICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
        params![
            service.id,
            service.shop_id,
            service.name,
            service.description,
            service.category.as_str(),
            service.duration_minutes,
            service.buffer_time_minutes,
            service.price.to_string(),
            service.active,
            fmt_ts(&service.created_at),
            fmt_ts(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn set_service_active(
    conn: &Connection,
    id: &str,
    active: bool,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET active = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, active, fmt_ts(now)],
    )?;
    Ok(count > 0)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
            params![id],
            |row| Ok(parse_service_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn list_services_for_shop(conn: &Connection, shop_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE shop_id = ?1 AND active = 1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![shop_id], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let category: String = row.get(4)?;
    let price: String = row.get(7)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Service {
        id: row.get(0)?,
        shop_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category: ServiceCategory::parse(&category),
        duration_minutes: row.get(5)?,
        buffer_time_minutes: row.get(6)?,
        price: Decimal::from_str(&price).with_context(|| format!("bad price: {price}"))?,
        active: row.get(8)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, shop_id, staff_id, service_id, user_id, appointment_date_time, duration_minutes, buffer_minutes, status, payment_status, notes, total_amount, advance_amount, cancellation_reason, cancelled_at, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}, occupied_until)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ),
        params![
            booking.id,
            booking.shop_id,
            booking.staff_id,
            booking.service_id,
            booking.user_id,
            fmt_ts(&booking.appointment_date_time),
            booking.duration_minutes,
            booking.buffer_minutes,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.notes,
            booking.total_amount.to_string(),
            booking.advance_amount.to_string(),
            booking.cancellation_reason,
            booking.cancelled_at.as_ref().map(fmt_ts),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
            fmt_ts(&booking.interval().end),
        ],
    )?;
    Ok(())
}

/// Writes the mutable fields of `booking` only if the stored status still equals
/// `expected`. Returns false when another writer got there first.
pub fn update_booking(
    conn: &Connection,
    booking: &Booking,
    expected: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            appointment_date_time = ?3, occupied_until = ?4, status = ?5, payment_status = ?6,
            cancellation_reason = ?7, cancelled_at = ?8, updated_at = ?9
         WHERE id = ?1 AND status = ?2",
        params![
            booking.id,
            expected.as_str(),
            fmt_ts(&booking.appointment_date_time),
            fmt_ts(&booking.interval().end),
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.cancellation_reason,
            booking.cancelled_at.as_ref().map(fmt_ts),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    result.transpose()
}

/// Bookings of `staff_id` in one of `statuses` whose derived interval overlaps `window`.
pub fn get_overlapping_bookings(
    conn: &Connection,
    staff_id: &str,
    window: &Interval,
    statuses: &[BookingStatus],
) -> anyhow::Result<Vec<Booking>> {
    let mut values = vec![
        staff_id.to_string(),
        fmt_ts(&window.end),
        fmt_ts(&window.start),
    ];
    values.extend(statuses.iter().map(|s| s.as_str().to_string()));

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE staff_id = ?1 AND appointment_date_time < ?2 AND occupied_until > ?3
           AND status IN ({})
         ORDER BY appointment_date_time ASC",
        placeholders(4, statuses.len())
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Which column a booking listing is filtered by.
#[derive(Debug, Clone, Copy)]
pub enum BookingOwner<'a> {
    Shop(&'a str),
    Staff(&'a str),
    User(&'a str),
}

pub fn list_bookings(
    conn: &Connection,
    owner: BookingOwner<'_>,
    from: Option<&NaiveDateTime>,
    to: Option<&NaiveDateTime>,
) -> anyhow::Result<Vec<Booking>> {
    let (column, id) = match owner {
        BookingOwner::Shop(id) => ("shop_id", id),
        BookingOwner::Staff(id) => ("staff_id", id),
        BookingOwner::User(id) => ("user_id", id),
    };

    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE {column} = ?1");
    let mut values = vec![id.to_string()];
    if let Some(from) = from {
        values.push(fmt_ts(from));
        sql.push_str(&format!(" AND appointment_date_time >= ?{}", values.len()));
    }
    if let Some(to) = to {
        values.push(fmt_ts(to));
        sql.push_str(&format!(" AND appointment_date_time < ?{}", values.len()));
    }
    sql.push_str(" ORDER BY appointment_date_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let appointment: String = row.get(5)?;
    let status: String = row.get(8)?;
    let payment_status: String = row.get(9)?;
    let total_amount: String = row.get(11)?;
    let advance_amount: String = row.get(12)?;
    let cancelled_at: Option<String> = row.get(14)?;
    let created_at: String = row.get(15)?;
    let updated_at: String = row.get(16)?;

    Ok(Booking {
        id: row.get(0)?,
        shop_id: row.get(1)?,
        staff_id: row.get(2)?,
        service_id: row.get(3)?,
        user_id: row.get(4)?,
        appointment_date_time: parse_ts(&appointment)?,
        duration_minutes: row.get(6)?,
        buffer_minutes: row.get(7)?,
        status: BookingStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown booking status: {status}"))?,
        payment_status: PaymentStatus::parse(&payment_status)
            .ok_or_else(|| anyhow::anyhow!("unknown payment status: {payment_status}"))?,
        notes: row.get(10)?,
        total_amount: Decimal::from_str(&total_amount)?,
        advance_amount: Decimal::from_str(&advance_amount)?,
        cancellation_reason: row.get(13)?,
        cancelled_at: cancelled_at.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Staff locks ──

/// Takes the lease on `staff_id` for `holder` unless a live lease is held by someone else.
pub fn try_acquire_staff_lock(
    conn: &Connection,
    staff_id: &str,
    holder: &str,
    now: &NaiveDateTime,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT INTO staff_locks (staff_id, holder, expires_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(staff_id) DO UPDATE SET holder = excluded.holder, expires_at = excluded.expires_at
         WHERE staff_locks.expires_at <= ?4",
        params![staff_id, holder, fmt_ts(expires_at), fmt_ts(now)],
    )?;
    Ok(count > 0)
}

pub fn release_staff_lock(conn: &Connection, staff_id: &str, holder: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM staff_locks WHERE staff_id = ?1 AND holder = ?2",
        params![staff_id, holder],
    )?;
    Ok(count > 0)
}
