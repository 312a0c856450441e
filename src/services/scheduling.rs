//! Booking entry points. Every write to a staff member's calendar goes through
//! here: validate against the catalog, take the staff lease, re-check for
//! overlaps inside a transaction, then commit and notify.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::{self, queries};
use crate::errors::SchedulingError;
use crate::models::{Booking, BookingStatus, Interval, PaymentStatus, Service, Shop, Staff};
use crate::services::availability;
use crate::services::conflict;
use crate::services::lifecycle::{self, PaymentEvent};
use crate::services::notifications::{self, BookingEvent, BookingEventKind};
use crate::services::staff_lock::StaffLease;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub shop_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub user_id: String,
    /// Shop-local wall clock time.
    pub appointment_date_time: NaiveDateTime,
    pub notes: Option<String>,
}

struct Catalog {
    shop: Shop,
    staff: Staff,
    service: Service,
}

fn load_catalog(
    conn: &Connection,
    shop_id: &str,
    staff_id: &str,
    service_id: &str,
) -> Result<Catalog, SchedulingError> {
    let shop = queries::get_shop(conn, shop_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("shop {shop_id}")))?;
    let staff = queries::get_staff(conn, staff_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("staff {staff_id}")))?;
    let service = queries::get_service(conn, service_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("service {service_id}")))?;
    Ok(Catalog {
        shop,
        staff,
        service,
    })
}

fn check_eligible(c: &Catalog) -> Result<(), SchedulingError> {
    let reason = if !c.shop.active {
        "shop is inactive"
    } else if !c.staff.active {
        "staff member is inactive"
    } else if !c.service.active {
        "service is inactive"
    } else if c.staff.shop_id != c.shop.id {
        "staff member does not work at this shop"
    } else if c.service.shop_id != c.shop.id {
        "service is not offered by this shop"
    } else if !c.staff.offers(&c.service.id) {
        "staff member does not perform this service"
    } else {
        return Ok(());
    };
    Err(SchedulingError::NotEligible(reason.to_string()))
}

/// Steps 1 and 2 of booking: the entities resolve, are eligible, and `at` is
/// one of the computed slots for its day.
fn validate_request(
    conn: &Connection,
    req: &BookingRequest,
    now: DateTime<Utc>,
) -> Result<Catalog, SchedulingError> {
    let catalog = load_catalog(conn, &req.shop_id, &req.staff_id, &req.service_id)?;
    check_eligible(&catalog)?;

    let at = req.appointment_date_time;
    let slots = availability::compute_slots(
        &catalog.shop,
        &catalog.staff,
        &catalog.service,
        at.date(),
        catalog.shop.local_now(now),
    )?;
    if !slots.contains(&at) {
        return Err(SchedulingError::SlotUnavailable);
    }
    Ok(catalog)
}

const MONEY_DP: u32 = 2;

fn money(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(MONEY_DP);
    amount
}

fn advance_amount(total: Decimal, percentage: u32) -> Decimal {
    money(total * Decimal::from(percentage) / Decimal::from(100))
}

fn lock_timeout(state: &AppState) -> Duration {
    Duration::from_millis(state.config.lock_timeout_ms)
}

fn notify(state: &AppState, kind: BookingEventKind, booking: &Booking) {
    notifications::dispatch(state.notifier.clone(), BookingEvent::new(kind, booking));
}

pub async fn create_booking(
    state: &AppState,
    req: BookingRequest,
    now: DateTime<Utc>,
) -> Result<Booking, SchedulingError> {
    // optimistic pass, no lease yet
    {
        let conn = db::lock(&state.db);
        validate_request(&conn, &req, now)?;
    }

    let _lease = StaffLease::acquire(
        &state.db,
        &req.staff_id,
        lock_timeout(state),
        state.config.lock_lease_secs,
    )
    .await?;

    let booking = {
        let mut conn = db::lock(&state.db);
        let tx = conn.transaction().context("failed to begin booking transaction")?;

        // catalog may have changed while waiting for the lease
        let Catalog { shop, service, .. } = validate_request(&tx, &req, now)?;

        let candidate = Interval::occupied(req.appointment_date_time, service.occupied_minutes());
        if conflict::has_conflict(&tx, &req.staff_id, &candidate, None)? {
            tracing::info!(
                staff_id = %req.staff_id,
                at = %req.appointment_date_time,
                "booking lost the race for its slot"
            );
            return Err(SchedulingError::SlotConflict);
        }

        let local_now = shop.local_now(now);
        let total = money(service.price);
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            shop_id: shop.id.clone(),
            staff_id: req.staff_id.clone(),
            service_id: service.id.clone(),
            user_id: req.user_id.clone(),
            appointment_date_time: req.appointment_date_time,
            duration_minutes: service.duration_minutes,
            buffer_minutes: service.buffer_time_minutes,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: req.notes.clone(),
            total_amount: total,
            advance_amount: advance_amount(total, shop.settings.advance_payment_percentage),
            cancellation_reason: None,
            cancelled_at: None,
            created_at: local_now,
            updated_at: local_now,
        };

        queries::create_booking(&tx, &booking)?;
        tx.commit().context("failed to commit booking")?;
        booking
    };

    tracing::info!(
        booking_id = %booking.id,
        staff_id = %booking.staff_id,
        at = %booking.appointment_date_time,
        "booking created"
    );
    notify(state, BookingEventKind::Created, &booking);
    Ok(booking)
}

// ── Reads ──

pub fn get_booking(state: &AppState, booking_id: &str) -> Result<Booking, SchedulingError> {
    let conn = db::lock(&state.db);
    load_booking(&conn, booking_id)
}

fn load_booking(conn: &Connection, booking_id: &str) -> Result<Booking, SchedulingError> {
    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("booking {booking_id}")))
}

pub fn list_bookings(
    state: &AppState,
    owner: queries::BookingOwner<'_>,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> Result<Vec<Booking>, SchedulingError> {
    if let (Some(from), Some(to)) = (from, to) {
        Interval::new(from, to).ok_or_else(|| {
            SchedulingError::InvalidRequest(format!("range {from} to {to} is empty"))
        })?;
    }
    let conn = db::lock(&state.db);
    Ok(queries::list_bookings(&conn, owner, from.as_ref(), to.as_ref())?)
}

/// Computed slots for `date` minus those already taken. A hint only; the
/// answer can change before the caller books.
pub fn available_slots(
    state: &AppState,
    shop_id: &str,
    staff_id: &str,
    service_id: &str,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<NaiveDateTime>, SchedulingError> {
    let conn = db::lock(&state.db);
    let c = load_catalog(&conn, shop_id, staff_id, service_id)?;

    let slots =
        availability::compute_slots(&c.shop, &c.staff, &c.service, date, c.shop.local_now(now))?;
    if slots.is_empty() {
        return Ok(slots);
    }

    let existing = queries::get_overlapping_bookings(
        &conn,
        staff_id,
        &conflict::day_window(date),
        &BookingStatus::BLOCKING,
    )?;
    Ok(conflict::without_conflicts(
        slots,
        c.service.occupied_minutes(),
        &existing,
    ))
}

// ── Transitions ──

/// Conditional write of `booking`. If the stored status moved away from
/// `expected` meanwhile, reports the transition as illegal from the status
/// that is actually stored now.
fn persist(
    conn: &Connection,
    booking: &Booking,
    expected: BookingStatus,
) -> Result<(), SchedulingError> {
    if queries::update_booking(conn, booking, expected)? {
        return Ok(());
    }
    let current = load_booking(conn, &booking.id)?;
    tracing::info!(
        booking_id = %booking.id,
        expected = %expected,
        actual = %current.status,
        "booking changed concurrently"
    );
    Err(SchedulingError::InvalidStateTransition {
        from: current.status,
        to: booking.status,
    })
}

fn shop_now(conn: &Connection, booking: &Booking, now: DateTime<Utc>) -> Result<NaiveDateTime, SchedulingError> {
    let shop = queries::get_shop(conn, &booking.shop_id)?
        .ok_or_else(|| SchedulingError::NotFound(format!("shop {}", booking.shop_id)))?;
    Ok(shop.local_now(now))
}

pub fn cancel_booking(
    state: &AppState,
    booking_id: &str,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Booking, SchedulingError> {
    let booking = {
        let conn = db::lock(&state.db);
        let mut booking = load_booking(&conn, booking_id)?;
        let expected = booking.status;
        let local_now = shop_now(&conn, &booking, now)?;

        lifecycle::cancel(&mut booking, reason, local_now)?;
        persist(&conn, &booking, expected)?;
        booking
    };

    tracing::info!(booking_id, "booking cancelled");
    notify(state, BookingEventKind::Cancelled, &booking);
    Ok(booking)
}

/// Shop-side status change: check-in, completion, no-show, cancellation.
pub fn update_status(
    state: &AppState,
    booking_id: &str,
    to: BookingStatus,
    now: DateTime<Utc>,
) -> Result<Booking, SchedulingError> {
    if to == BookingStatus::Cancelled {
        return cancel_booking(state, booking_id, None, now);
    }

    let booking = {
        let conn = db::lock(&state.db);
        let mut booking = load_booking(&conn, booking_id)?;
        let expected = booking.status;
        let local_now = shop_now(&conn, &booking, now)?;

        lifecycle::transition(&mut booking, to, local_now)?;
        persist(&conn, &booking, expected)?;
        booking
    };

    tracing::info!(booking_id, status = %to, "booking status updated");
    if to == BookingStatus::Confirmed {
        notify(state, BookingEventKind::Confirmed, &booking);
    }
    Ok(booking)
}

/// Moves a pending or confirmed future booking to another computed slot.
pub async fn reschedule_booking(
    state: &AppState,
    booking_id: &str,
    new_time: NaiveDateTime,
    now: DateTime<Utc>,
) -> Result<Booking, SchedulingError> {
    let staff_id = {
        let conn = db::lock(&state.db);
        check_reschedulable(&conn, booking_id, new_time, now)?.staff_id
    };

    let _lease = StaffLease::acquire(
        &state.db,
        &staff_id,
        lock_timeout(state),
        state.config.lock_lease_secs,
    )
    .await?;

    let booking = {
        let mut conn = db::lock(&state.db);
        let tx = conn
            .transaction()
            .context("failed to begin reschedule transaction")?;

        let mut booking = check_reschedulable(&tx, booking_id, new_time, now)?;
        let expected = booking.status;

        let candidate = Interval::occupied(
            new_time,
            booking.duration_minutes.saturating_add(booking.buffer_minutes),
        );
        if conflict::has_conflict(&tx, &booking.staff_id, &candidate, Some(booking_id))? {
            return Err(SchedulingError::SlotConflict);
        }

        booking.appointment_date_time = new_time;
        booking.updated_at = shop_now(&tx, &booking, now)?;
        persist(&tx, &booking, expected)?;
        tx.commit().context("failed to commit reschedule")?;
        booking
    };

    tracing::info!(booking_id, at = %new_time, "booking rescheduled");
    notify(state, BookingEventKind::Rescheduled, &booking);
    Ok(booking)
}

fn check_reschedulable(
    conn: &Connection,
    booking_id: &str,
    new_time: NaiveDateTime,
    now: DateTime<Utc>,
) -> Result<Booking, SchedulingError> {
    let booking = load_booking(conn, booking_id)?;
    if !matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Confirmed
    ) {
        return Err(SchedulingError::InvalidRequest(format!(
            "a {} booking cannot be rescheduled",
            booking.status
        )));
    }

    let mut catalog = load_catalog(conn, &booking.shop_id, &booking.staff_id, &booking.service_id)?;
    check_eligible(&catalog)?;
    let local_now = catalog.shop.local_now(now);
    if booking.appointment_date_time <= local_now {
        return Err(SchedulingError::InvalidRequest(
            "the appointment has already started".to_string(),
        ));
    }

    // slot fit is judged with the length the customer booked
    catalog.service.duration_minutes = booking.duration_minutes;
    catalog.service.buffer_time_minutes = booking.buffer_minutes;
    let slots = availability::compute_slots(
        &catalog.shop,
        &catalog.staff,
        &catalog.service,
        new_time.date(),
        local_now,
    )?;
    if !slots.contains(&new_time) {
        return Err(SchedulingError::SlotUnavailable);
    }
    Ok(booking)
}

// ── Payments ──

/// Callback from the payment collaborator.
pub fn payment_event(
    state: &AppState,
    booking_id: &str,
    event: PaymentEvent,
    now: DateTime<Utc>,
) -> Result<Booking, SchedulingError> {
    let booking = {
        let conn = db::lock(&state.db);
        let mut booking = load_booking(&conn, booking_id)?;
        let expected = booking.status;
        let local_now = shop_now(&conn, &booking, now)?;

        lifecycle::apply_payment(&mut booking, event, local_now)?;
        persist(&conn, &booking, expected)?;
        booking
    };

    tracing::info!(
        booking_id,
        payment_status = %booking.payment_status,
        status = %booking.status,
        "payment recorded"
    );
    if event == PaymentEvent::Completed {
        notify(state, BookingEventKind::Confirmed, &booking);
    }
    Ok(booking)
}
