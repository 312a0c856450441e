//! Concurrent booking attempts against one staff calendar.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use proptest::prelude::*;
use tokio::task::JoinSet;

use barbershop::db::{self, queries};
use barbershop::errors::SchedulingError;
use barbershop::models::{Booking, BookingStatus, ShopSettings};
use barbershop::services::scheduling::{self, BookingRequest};
use barbershop::state::AppState;

use crate::fixtures::{app_state, monday, service, shop, staff};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap()
}

fn state() -> Arc<AppState> {
    Arc::new(app_state(
        &shop(9 * 60, 18 * 60, ShopSettings::default()),
        &staff(&[(9 * 60, 13 * 60, true), (14 * 60, 18 * 60, true)]),
        &service(30, 5),
    ))
}

fn request(user: usize, at: NaiveDateTime) -> BookingRequest {
    BookingRequest {
        shop_id: "shop-1".to_string(),
        staff_id: "staff-1".to_string(),
        service_id: "svc-1".to_string(),
        user_id: format!("user-{user}"),
        appointment_date_time: at,
        notes: None,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

/// Fires every request at once and returns each outcome with its start time.
fn race(
    state: &Arc<AppState>,
    times: &[NaiveDateTime],
) -> Vec<(NaiveDateTime, Result<Booking, SchedulingError>)> {
    runtime().block_on(async {
        let mut set = JoinSet::new();
        for (user, at) in times.iter().copied().enumerate() {
            let state = state.clone();
            set.spawn(async move {
                let result = scheduling::create_booking(&state, request(user, at), now()).await;
                (at, result)
            });
        }

        let mut outcomes = vec![];
        while let Some(joined) = set.join_next().await {
            outcomes.push(joined.unwrap());
        }
        outcomes
    })
}

fn stored_blocking(state: &AppState) -> Vec<Booking> {
    let conn = db::lock(&state.db);
    queries::list_bookings(&conn, queries::BookingOwner::Staff("staff-1"), None, None)
        .unwrap()
        .into_iter()
        .filter(|b| b.blocks_calendar())
        .collect()
}

#[test]
fn same_slot_exactly_one_wins() {
    let state = state();
    let at = monday().and_hms_opt(10, 0, 0).unwrap();
    let outcomes = race(&state, &[at; 8]);

    let winners: Vec<&Booking> = outcomes.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].status, BookingStatus::Pending);
    assert!(outcomes
        .iter()
        .filter_map(|(_, r)| r.as_ref().err())
        .all(|e| matches!(e, SchedulingError::SlotConflict)));
    assert_eq!(stored_blocking(&state).len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: whatever the interleaving, accepted bookings never overlap, and
    /// every rejected request really did collide with an accepted one.
    #[test]
    fn property_no_double_booking(
        hours in proptest::collection::vec(
            prop::sample::select(vec![(10u32, 0u32), (10, 30), (11, 0), (11, 30), (14, 0), (14, 30)]),
            2..8,
        ),
    ) {
        let state = state();
        let times: Vec<NaiveDateTime> = hours
            .iter()
            .map(|&(h, m)| monday().and_hms_opt(h, m, 0).unwrap())
            .collect();

        let outcomes = race(&state, &times);
        let winners: Vec<Booking> = outcomes
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok().cloned())
            .collect();

        for (i, a) in winners.iter().enumerate() {
            for b in &winners[i + 1..] {
                prop_assert!(!a.interval().overlaps(&b.interval()));
            }
        }

        for (at, result) in &outcomes {
            if let Err(e) = result {
                prop_assert!(matches!(e, SchedulingError::SlotConflict), "unexpected error: {e}");
                let wanted = barbershop::models::Interval::occupied(*at, 35);
                prop_assert!(winners.iter().any(|w| w.interval().overlaps(&wanted)));
            }
        }

        let stored = stored_blocking(&state);
        prop_assert_eq!(stored.len(), winners.len());
        for (i, a) in stored.iter().enumerate() {
            for b in &stored[i + 1..] {
                prop_assert!(!a.interval().overlaps(&b.interval()));
            }
        }
    }
}
