//! Property tests for slot computation.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use proptest::prelude::*;

use barbershop::models::{BookingStatus, ShopSettings};
use barbershop::services::availability::compute_slots;
use barbershop::services::scheduling::{self, BookingRequest};

use crate::fixtures::{app_state, monday, service, shop, staff, windows_from_bounds};

fn minute_of(dt: &NaiveDateTime) -> u32 {
    dt.hour() * 60 + dt.minute()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: the computed slots are exactly the grid points of each open
    /// interval whose service fits before the interval ends and that respect
    /// the lead time. Soundness and completeness in one.
    #[test]
    fn property_slots_are_sound_and_complete(
        open in (6u32 * 60..=11 * 60).prop_map(|m| m / 5 * 5),
        close in (14u32 * 60..=21 * 60).prop_map(|m| m / 5 * 5),
        bounds in proptest::collection::btree_set((5u32 * 12..=23 * 12).prop_map(|u| u * 5), 0..=6),
        available in proptest::collection::vec(prop::bool::weighted(0.8), 3),
        duration in (1u32..=24).prop_map(|u| u * 5),
        buffer in (0u32..=6).prop_map(|u| u * 5),
        step in prop::sample::select(vec![5u32, 10, 15, 20, 30, 45, 60]),
        now_minute in 0u32..24 * 60,
    ) {
        let bounds: Vec<u32> = bounds.into_iter().collect();
        let windows = windows_from_bounds(&bounds, &available);
        let settings = ShopSettings {
            slot_duration_minutes: step,
            ..ShopSettings::default()
        };
        let shop = shop(open, close, settings);
        let staff = staff(&windows);
        let service = service(duration, buffer);

        let midnight = monday().and_time(NaiveTime::MIN);
        let now = midnight + Duration::minutes(now_minute as i64);
        let earliest = now + Duration::minutes(shop.settings.min_lead_time_minutes as i64);

        let slots = compute_slots(&shop, &staff, &service, monday(), now).unwrap();

        // chronological and on the requested day
        prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(slots.iter().all(|s| s.date() == monday()));

        let needed = duration + buffer;
        let mut expected = BTreeSet::new();
        for &(start, end, is_open) in &windows {
            if !is_open {
                continue;
            }
            let (lo, hi) = (start.max(open), end.min(close));
            if lo >= hi {
                continue;
            }
            let mut m = lo;
            while m + needed <= hi {
                if midnight + Duration::minutes(m as i64) >= earliest {
                    expected.insert(m);
                }
                m += step;
            }
        }

        let actual: BTreeSet<u32> = slots.iter().map(minute_of).collect();
        prop_assert_eq!(actual, expected);

        // every slot's derived interval sits inside business hours and one open staff window
        for slot in &slots {
            let s = minute_of(slot);
            prop_assert!(s >= open && s + needed <= close);
            prop_assert!(windows.iter().any(|&(ws, we, ok)| ok && s >= ws && s + needed <= we));
        }
    }

    /// PROPERTY: turning online booking off or deactivating anything empties the result,
    /// it never errors for an in-window date.
    #[test]
    fn property_unbookable_is_empty_not_error(
        which in 0usize..4,
        duration in (1u32..=12).prop_map(|u| u * 5),
    ) {
        let mut shop = shop(9 * 60, 18 * 60, ShopSettings::default());
        let mut staff = staff(&[(9 * 60, 18 * 60, true)]);
        let mut service = service(duration, 5);
        match which {
            0 => shop.settings.allow_online_booking = false,
            1 => shop.active = false,
            2 => staff.active = false,
            _ => service.active = false,
        }
        let now = monday().and_time(NaiveTime::MIN) - Duration::days(2);
        let slots = compute_slots(&shop, &staff, &service, monday(), now).unwrap();
        prop_assert!(slots.is_empty());
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: with nobody else booking, every start time offered by
    /// `available_slots` is accepted by `create_booking` as a PENDING booking.
    #[test]
    fn property_every_offered_slot_can_be_booked(
        open in (6u32 * 60..=11 * 60).prop_map(|m| m / 5 * 5),
        close in (14u32 * 60..=21 * 60).prop_map(|m| m / 5 * 5),
        bounds in proptest::collection::btree_set((5u32 * 12..=23 * 12).prop_map(|u| u * 5), 0..=6),
        available in proptest::collection::vec(prop::bool::weighted(0.8), 3),
        duration in (1u32..=12).prop_map(|u| u * 5),
        buffer in (0u32..=6).prop_map(|u| u * 5),
        step in prop::sample::select(vec![15u32, 20, 30, 45, 60]),
        days_before in 0i64..=3,
        now_minute in 0u32..24 * 60,
    ) {
        let bounds: Vec<u32> = bounds.into_iter().collect();
        let windows = windows_from_bounds(&bounds, &available);
        let settings = ShopSettings {
            slot_duration_minutes: step,
            ..ShopSettings::default()
        };
        let shop = shop(open, close, settings);
        let staff = staff(&windows);
        let service = service(duration, buffer);

        // utc offset is zero, so shop-local and UTC clocks agree
        let local_now = monday().and_time(NaiveTime::MIN) - Duration::days(days_before)
            + Duration::minutes(now_minute as i64);
        let now = Utc.from_utc_datetime(&local_now);

        let offered = {
            let state = app_state(&shop, &staff, &service);
            scheduling::available_slots(&state, "shop-1", "staff-1", "svc-1", monday(), now)
                .unwrap()
        };

        let rt = runtime();
        for slot in offered {
            let state = app_state(&shop, &staff, &service);
            let request = BookingRequest {
                shop_id: "shop-1".to_string(),
                staff_id: "staff-1".to_string(),
                service_id: "svc-1".to_string(),
                user_id: "user-1".to_string(),
                appointment_date_time: slot,
                notes: None,
            };
            match rt.block_on(scheduling::create_booking(&state, request, now)) {
                Ok(booking) => {
                    prop_assert_eq!(booking.status, BookingStatus::Pending);
                    prop_assert_eq!(booking.appointment_date_time, slot);
                }
                Err(e) => prop_assert!(false, "{} was offered but booking failed: {}", slot, e),
            }
        }
    }
}
