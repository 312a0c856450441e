use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::SchedulingError;
use crate::models::{Booking, BookingStatus, Interval};

/// First booking in `existing` that keeps the staff member busy during `candidate`.
pub fn find_conflict<'a>(
    existing: &'a [Booking],
    candidate: &Interval,
    exclude_booking_id: Option<&str>,
) -> Option<&'a Booking> {
    existing.iter().find(|b| {
        b.blocks_calendar()
            && Some(b.id.as_str()) != exclude_booking_id
            && b.interval().overlaps(candidate)
    })
}

/// Reads the staff member's current bookings and checks `candidate` against them.
/// Run this inside the staff lock for an authoritative answer.
pub fn has_conflict(
    conn: &Connection,
    staff_id: &str,
    candidate: &Interval,
    exclude_booking_id: Option<&str>,
) -> Result<bool, SchedulingError> {
    let existing =
        queries::get_overlapping_bookings(conn, staff_id, candidate, &BookingStatus::BLOCKING)?;

    let conflict = find_conflict(&existing, candidate, exclude_booking_id);
    if let Some(b) = conflict {
        tracing::debug!(
            staff_id,
            booking_id = %b.id,
            start = %candidate.start,
            end = %candidate.end,
            "candidate interval overlaps existing booking"
        );
    }
    Ok(conflict.is_some())
}

/// Drops the start times whose `[start, start + minutes)` would hit an existing booking.
pub fn without_conflicts(
    slots: Vec<NaiveDateTime>,
    minutes: u32,
    existing: &[Booking],
) -> Vec<NaiveDateTime> {
    slots
        .into_iter()
        .filter(|start| find_conflict(existing, &Interval::occupied(*start, minutes), None).is_none())
        .collect()
}

/// Interval covering every booking that can overlap a slot on `date`.
pub fn day_window(date: NaiveDate) -> Interval {
    let start = date.and_time(NaiveTime::MIN);
    Interval {
        start,
        end: start + Duration::days(1),
    }
}
