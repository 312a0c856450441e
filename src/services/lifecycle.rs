//! Booking status transitions and payment status bookkeeping.
//!
//! ```text
//! PENDING ──payment──▶ CONFIRMED ──start──▶ IN_PROGRESS ──done──▶ COMPLETED
//!    │                   │   │
//!    └──cancel──▶ CANCELLED ◀┘   └──no-show──▶ NO_SHOW
//! ```

use chrono::NaiveDateTime;

use crate::errors::SchedulingError;
use crate::models::{Booking, BookingStatus, PaymentStatus};

/// Whether `from -> to` appears in the transition table at all, ignoring guards.
pub fn is_listed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Cancelled)
            | (Confirmed, InProgress)
            | (Confirmed, NoShow)
            | (InProgress, Completed)
    )
}

fn guard_holds(booking: &Booking, to: BookingStatus, now: NaiveDateTime) -> bool {
    use BookingStatus::*;
    let at = booking.appointment_date_time;
    match (booking.status, to) {
        (Pending, Confirmed) => booking.payment_status == PaymentStatus::Completed,
        (Pending, Cancelled) => true,
        (Confirmed, Cancelled) => at > now,
        (Confirmed, InProgress) => at <= now,
        (Confirmed, NoShow) => at < now,
        (InProgress, Completed) => true,
        _ => false,
    }
}

/// Moves `booking` to `to` if the table lists the move and its guard holds.
/// On failure the booking is left untouched.
pub fn transition(
    booking: &mut Booking,
    to: BookingStatus,
    now: NaiveDateTime,
) -> Result<(), SchedulingError> {
    let from = booking.status;
    if !is_listed(from, to) || !guard_holds(booking, to, now) {
        return Err(SchedulingError::InvalidStateTransition { from, to });
    }
    booking.status = to;
    booking.updated_at = now;
    Ok(())
}

/// Cancels and records when and why. The record is kept for audit.
pub fn cancel(
    booking: &mut Booking,
    reason: Option<String>,
    now: NaiveDateTime,
) -> Result<(), SchedulingError> {
    transition(booking, BookingStatus::Cancelled, now)?;
    booking.cancelled_at = Some(now);
    booking.cancellation_reason = reason;
    Ok(())
}

/// Callbacks from the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    Started,
    Completed,
    Failed,
    Refunded,
}

/// Applies a payment callback. Completing the advance payment confirms a
/// pending booking; the other events only touch the payment status.
pub fn apply_payment(
    booking: &mut Booking,
    event: PaymentEvent,
    now: NaiveDateTime,
) -> Result<(), SchedulingError> {
    use PaymentStatus as P;

    // completion is the PENDING -> CONFIRMED transition
    if event == PaymentEvent::Completed && booking.status != BookingStatus::Pending {
        return Err(SchedulingError::InvalidStateTransition {
            from: booking.status,
            to: BookingStatus::Confirmed,
        });
    }

    let current = booking.payment_status;
    let next = match (event, current) {
        (PaymentEvent::Started, P::Pending | P::Failed) => P::Processing,
        (PaymentEvent::Completed, P::Pending | P::Processing | P::Failed) => P::Completed,
        (PaymentEvent::Failed, P::Pending | P::Processing) => P::Failed,
        (PaymentEvent::Refunded, P::Completed) => P::Refunded,
        _ => {
            return Err(SchedulingError::InvalidRequest(format!(
                "payment is {current}, cannot apply {event:?}"
            )))
        }
    };

    match event {
        PaymentEvent::Started | PaymentEvent::Failed
            if booking.status != BookingStatus::Pending =>
        {
            return Err(SchedulingError::InvalidRequest(format!(
                "booking is {}, payment no longer expected",
                booking.status
            )));
        }
        PaymentEvent::Refunded if booking.status != BookingStatus::Cancelled => {
            return Err(SchedulingError::InvalidRequest(format!(
                "booking is {}, only cancelled bookings are refunded",
                booking.status
            )));
        }
        _ => {}
    }

    if event == PaymentEvent::Completed {
        let mut confirmed = booking.clone();
        confirmed.payment_status = next;
        transition(&mut confirmed, BookingStatus::Confirmed, now)?;
        *booking = confirmed;
        return Ok(());
    }

    booking.payment_status = next;
    booking.updated_at = now;
    Ok(())
}
