//! Catalog builders shared by the property tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use barbershop::config::AppConfig;
use barbershop::db::{self, queries};
use barbershop::models::{
    AvailabilityWindow, BusinessHours, DayOfWeek, Service, ServiceCategory, Shop, ShopSettings,
    Staff, StaffAvailability, TimeWindow,
};
use barbershop::services::notifications::LogNotifier;
use barbershop::state::AppState;

/// 2025-06-16 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

pub fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_time(NaiveTime::MIN)
}

pub fn time(minutes: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0).unwrap()
}

pub fn shop(open: u32, close: u32, settings: ShopSettings) -> Shop {
    let hours = BusinessHours(BTreeMap::from([(
        DayOfWeek::Monday,
        Some(TimeWindow::new(time(open), time(close)).unwrap()),
    )]));
    Shop {
        id: "shop-1".to_string(),
        owner_id: "owner-1".to_string(),
        name: "Fade Factory".to_string(),
        address: String::new(),
        phone: String::new(),
        business_hours: hours,
        settings,
        utc_offset_minutes: 0,
        active: true,
        created_at: created(),
        updated_at: created(),
    }
}

/// `windows` are (start, end, available) in minutes of day, sorted and disjoint.
pub fn staff(windows: &[(u32, u32, bool)]) -> Staff {
    let monday = windows
        .iter()
        .map(|&(start, end, available)| AvailabilityWindow {
            start: time(start),
            end: time(end),
            available,
        })
        .collect();
    Staff {
        id: "staff-1".to_string(),
        shop_id: "shop-1".to_string(),
        name: "Sam".to_string(),
        phone: None,
        availability: StaffAvailability(BTreeMap::from([(DayOfWeek::Monday, monday)])),
        service_ids: vec!["svc-1".to_string()],
        active: true,
        created_at: created(),
        updated_at: created(),
    }
}

pub fn service(duration: u32, buffer: u32) -> Service {
    Service {
        id: "svc-1".to_string(),
        shop_id: "shop-1".to_string(),
        name: "Haircut".to_string(),
        description: None,
        category: ServiceCategory::Haircut,
        duration_minutes: duration,
        buffer_time_minutes: buffer,
        price: Decimal::new(2500, 2),
        active: true,
        created_at: created(),
        updated_at: created(),
    }
}

/// Turns a sorted set of boundaries into disjoint windows, pairing them up.
pub fn windows_from_bounds(bounds: &[u32], available: &[bool]) -> Vec<(u32, u32, bool)> {
    bounds
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| (pair[0], pair[1], available.get(i).copied().unwrap_or(true)))
        .collect()
}

/// A fresh in-memory database holding exactly this catalog.
pub fn app_state(shop: &Shop, staff: &Staff, service: &Service) -> AppState {
    let conn = db::init_db(":memory:").unwrap();
    queries::insert_shop(&conn, shop).unwrap();
    queries::insert_service(&conn, service).unwrap();
    queries::insert_staff(&conn, staff).unwrap();

    AppState {
        db: Arc::new(Mutex::new(conn)),
        config: AppConfig {
            port: 0,
            database_url: ":memory:".to_string(),
            admin_token: "test".to_string(),
            lock_timeout_ms: 5000,
            lock_lease_secs: 30,
            notify_webhook_url: None,
        },
        notifier: Arc::new(LogNotifier),
    }
}
