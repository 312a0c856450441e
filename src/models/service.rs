use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: ServiceCategory,
    pub duration_minutes: u32,
    /// Cleanup time after the service. Blocks the staff member but is not charged.
    pub buffer_time_minutes: u32,
    pub price: Decimal,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Service {
    /// Longest a single appointment may block a staff member, buffer included.
    pub const MAX_OCCUPIED_MINUTES: u32 = 24 * 60;

    pub fn occupied_minutes(&self) -> u32 {
        self.duration_minutes.saturating_add(self.buffer_time_minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Haircut,
    BeardTrim,
    Shave,
    Styling,
    Coloring,
    Treatment,
    #[default]
    Other,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Haircut => "HAIRCUT",
            ServiceCategory::BeardTrim => "BEARD_TRIM",
            ServiceCategory::Shave => "SHAVE",
            ServiceCategory::Styling => "STYLING",
            ServiceCategory::Coloring => "COLORING",
            ServiceCategory::Treatment => "TREATMENT",
            ServiceCategory::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "HAIRCUT" => ServiceCategory::Haircut,
            "BEARD_TRIM" => ServiceCategory::BeardTrim,
            "SHAVE" => ServiceCategory::Shave,
            "STYLING" => ServiceCategory::Styling,
            "COLORING" => ServiceCategory::Coloring,
            "TREATMENT" => ServiceCategory::Treatment,
            _ => ServiceCategory::Other,
        }
    }
}
