use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BusinessHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub business_hours: BusinessHours,
    pub settings: ShopSettings,
    /// Fixed offset of the shop's wall clock from UTC. Appointment times are shop-local.
    pub utc_offset_minutes: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Shop {
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.naive_utc() + Duration::minutes(self.utc_offset_minutes as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopSettings {
    pub advance_payment_percentage: u32,
    pub slot_duration_minutes: u32,
    pub buffer_time_minutes: u32,
    pub max_advance_booking_days: u32,
    pub min_lead_time_minutes: u32,
    pub allow_online_booking: bool,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            advance_payment_percentage: 20,
            slot_duration_minutes: 30,
            buffer_time_minutes: 5,
            max_advance_booking_days: 30,
            min_lead_time_minutes: 60,
            allow_online_booking: true,
        }
    }
}

impl ShopSettings {
    pub const MIN_ADVANCE_PERCENTAGE: u32 = 10;
    pub const MAX_ADVANCE_PERCENTAGE: u32 = 50;
    pub const MAX_SLOT_DURATION_MINUTES: u32 = 24 * 60;
    pub const MAX_BUFFER_MINUTES: u32 = 24 * 60;
    pub const MAX_ADVANCE_BOOKING_DAYS: u32 = 365;
    pub const MAX_LEAD_TIME_MINUTES: u32 = 30 * 24 * 60;

    pub fn validate(&self) -> Result<(), String> {
        if !(Self::MIN_ADVANCE_PERCENTAGE..=Self::MAX_ADVANCE_PERCENTAGE)
            .contains(&self.advance_payment_percentage)
        {
            return Err(format!(
                "advance payment percentage must be between {} and {}",
                Self::MIN_ADVANCE_PERCENTAGE,
                Self::MAX_ADVANCE_PERCENTAGE
            ));
        }
        if !(1..=Self::MAX_SLOT_DURATION_MINUTES).contains(&self.slot_duration_minutes) {
            return Err(format!(
                "slot duration must be between 1 and {} minutes",
                Self::MAX_SLOT_DURATION_MINUTES
            ));
        }
        if self.buffer_time_minutes > Self::MAX_BUFFER_MINUTES {
            return Err(format!(
                "buffer time must be at most {} minutes",
                Self::MAX_BUFFER_MINUTES
            ));
        }
        if !(1..=Self::MAX_ADVANCE_BOOKING_DAYS).contains(&self.max_advance_booking_days) {
            return Err(format!(
                "max advance booking days must be between 1 and {}",
                Self::MAX_ADVANCE_BOOKING_DAYS
            ));
        }
        if self.min_lead_time_minutes > Self::MAX_LEAD_TIME_MINUTES {
            return Err(format!(
                "min lead time must be at most {} minutes",
                Self::MAX_LEAD_TIME_MINUTES
            ));
        }
        Ok(())
    }
}
