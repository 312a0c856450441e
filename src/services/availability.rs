//! Bookable start times for a (shop, staff, service, date) tuple.
//!
//! Everything here is a pure function of its inputs. The result is only a hint:
//! the authoritative overlap check happens under the staff lock at commit time.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::SchedulingError;
use crate::models::schedule::minutes_of_day;
use crate::models::{DayOfWeek, Service, Shop, Staff, TimeWindow};

/// Fails with `InvalidRequest` when `date` lies before today or beyond the
/// shop's advance booking horizon (both measured on the shop-local clock).
pub fn check_booking_window(
    shop: &Shop,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<(), SchedulingError> {
    let today = now.date();
    let horizon = now
        .checked_add_signed(Duration::days(shop.settings.max_advance_booking_days as i64))
        .map_or(NaiveDate::MAX, |t| t.date());

    if date < today {
        return Err(SchedulingError::InvalidRequest(format!(
            "{date} is in the past"
        )));
    }
    if date > horizon {
        return Err(SchedulingError::InvalidRequest(format!(
            "{date} is more than {} days ahead",
            shop.settings.max_advance_booking_days
        )));
    }
    Ok(())
}

/// Shop business hours intersected with the staff member's open windows, in order.
pub fn open_intervals(shop: &Shop, staff: &Staff, day: DayOfWeek) -> Vec<TimeWindow> {
    let Some(hours) = shop.business_hours.for_day(day) else {
        return vec![];
    };
    staff
        .availability
        .open_windows(day)
        .filter_map(|w| w.intersect(&hours))
        .collect()
}

pub fn compute_slots(
    shop: &Shop,
    staff: &Staff,
    service: &Service,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Vec<NaiveDateTime>, SchedulingError> {
    check_booking_window(shop, date, now)?;

    let bookable = shop.settings.allow_online_booking
        && shop.active
        && staff.active
        && service.active
        && staff.shop_id == shop.id
        && service.shop_id == shop.id
        && staff.offers(&service.id);
    if !bookable {
        return Ok(vec![]);
    }

    let step = shop.settings.slot_duration_minutes.max(1);
    let Some(needed) = service
        .duration_minutes
        .checked_add(service.buffer_time_minutes)
    else {
        return Ok(vec![]);
    };
    let Some(earliest) =
        now.checked_add_signed(Duration::minutes(shop.settings.min_lead_time_minutes as i64))
    else {
        return Ok(vec![]);
    };
    let latest = now
        .checked_add_signed(Duration::days(shop.settings.max_advance_booking_days as i64))
        .unwrap_or(NaiveDateTime::MAX);
    let midnight = date.and_time(NaiveTime::MIN);

    let mut slots = vec![];
    for interval in open_intervals(shop, staff, DayOfWeek::of(date)) {
        let end = minutes_of_day(interval.end);
        let mut start = minutes_of_day(interval.start);
        while start.checked_add(needed).is_some_and(|finish| finish <= end) {
            let candidate = midnight + Duration::minutes(start as i64);
            if candidate >= earliest && candidate <= latest {
                slots.push(candidate);
            }
            let Some(next) = start.checked_add(step) else {
                break;
            };
            start = next;
        }
    }

    Ok(slots)
}
