//! Property tests for booking status transitions.

use chrono::{Duration, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use barbershop::errors::SchedulingError;
use barbershop::models::{Booking, BookingStatus, PaymentStatus};
use barbershop::services::lifecycle::{cancel, is_listed, transition};

use crate::fixtures::{created, monday};

const PAYMENT: [PaymentStatus; 5] = [
    PaymentStatus::Pending,
    PaymentStatus::Processing,
    PaymentStatus::Completed,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
];

fn appointment() -> NaiveDateTime {
    monday().and_hms_opt(10, 0, 0).unwrap()
}

fn booking(status: BookingStatus, payment_status: PaymentStatus) -> Booking {
    Booking {
        id: "b-1".to_string(),
        shop_id: "shop-1".to_string(),
        staff_id: "staff-1".to_string(),
        service_id: "svc-1".to_string(),
        user_id: "user-1".to_string(),
        appointment_date_time: appointment(),
        duration_minutes: 30,
        buffer_minutes: 5,
        status,
        payment_status,
        notes: None,
        total_amount: Decimal::new(2500, 2),
        advance_amount: Decimal::new(500, 2),
        cancellation_reason: None,
        cancelled_at: None,
        created_at: created(),
        updated_at: created(),
    }
}

/// The transition table written out independently of the implementation.
fn allowed(from: BookingStatus, to: BookingStatus, payment: PaymentStatus, now: NaiveDateTime) -> bool {
    use BookingStatus::*;
    let at = appointment();
    match (from, to) {
        (Pending, Confirmed) => payment == PaymentStatus::Completed,
        (Pending, Cancelled) => true,
        (Confirmed, Cancelled) => at > now,
        (Confirmed, InProgress) => at <= now,
        (Confirmed, NoShow) => at < now,
        (InProgress, Completed) => true,
        _ => false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a transition succeeds exactly when the table lists it and its guard holds;
    /// otherwise it fails with InvalidStateTransition and leaves the booking untouched.
    #[test]
    fn property_transition_legality(
        from in prop::sample::select(BookingStatus::ALL.to_vec()),
        to in prop::sample::select(BookingStatus::ALL.to_vec()),
        payment in prop::sample::select(PAYMENT.to_vec()),
        offset_minutes in -3000i64..3000,
    ) {
        let now = appointment() + Duration::minutes(offset_minutes);
        let mut b = booking(from, payment);
        let before = b.clone();

        let result = transition(&mut b, to, now);
        if allowed(from, to, payment, now) {
            prop_assert!(result.is_ok());
            prop_assert!(is_listed(from, to));
            prop_assert_eq!(b.status, to);
        } else {
            let is_invalid_transition = matches!(
                result,
                Err(SchedulingError::InvalidStateTransition { from: f, to: t }) if f == from && t == to
            );
            prop_assert!(is_invalid_transition);
            prop_assert_eq!(b.status, before.status);
            prop_assert_eq!(b.updated_at, before.updated_at);
        }
    }

    /// PROPERTY: terminal bookings never move and cancelling twice keeps the first record.
    #[test]
    fn property_terminal_states_are_final(
        to in prop::sample::select(BookingStatus::ALL.to_vec()),
        offset_minutes in -3000i64..3000,
        reason in proptest::option::of("[a-z ]{1,20}"),
    ) {
        let first = appointment() - Duration::days(2);
        let mut b = booking(BookingStatus::Pending, PaymentStatus::Pending);
        cancel(&mut b, Some("first".to_string()), first).unwrap();

        let now = appointment() + Duration::minutes(offset_minutes);
        prop_assert!(transition(&mut b, to, now).is_err());
        prop_assert!(cancel(&mut b, reason, now).is_err());
        prop_assert_eq!(b.status, BookingStatus::Cancelled);
        prop_assert_eq!(b.cancelled_at, Some(first));
        prop_assert_eq!(b.cancellation_reason.as_deref(), Some("first"));
    }
}
