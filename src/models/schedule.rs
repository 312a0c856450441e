use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(w: Weekday) -> Self {
        match w {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// A same-day wall-clock window `[start, end)`, written as `"09:00-18:00"`.
/// Windows cannot cross midnight, so the latest possible end is `23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> anyhow::Result<Self> {
        if start >= end {
            anyhow::bail!(
                "window start {} must be before end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            );
        }
        Ok(Self { start, end })
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("invalid time window: {s}"))?;
        Self::new(parse_time(start.trim())?, parse_time(end.trim())?)
    }

    pub fn intersect(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeWindow { start, end })
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        TimeWindow::parse(&s)
    }
}

impl From<TimeWindow> for String {
    fn from(w: TimeWindow) -> Self {
        w.to_string()
    }
}

/// Shop opening hours. A missing or `null` day means closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessHours(pub BTreeMap<DayOfWeek, Option<TimeWindow>>);

impl BusinessHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn for_day(&self, day: DayOfWeek) -> Option<TimeWindow> {
        self.0.get(&day).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl AvailabilityWindow {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}

/// Per-weekday working windows of a staff member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffAvailability(pub BTreeMap<DayOfWeek, Vec<AvailabilityWindow>>);

impl StaffAvailability {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let availability: StaffAvailability = serde_json::from_str(s)?;
        availability.validate()?;
        Ok(availability)
    }

    /// Windows must be well formed, sorted by start and must not overlap.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (day, windows) in &self.0 {
            for w in windows {
                if w.start >= w.end {
                    anyhow::bail!("{}: window {} is empty", day.as_str(), w.window());
                }
            }
            for pair in windows.windows(2) {
                if pair[1].start < pair[0].end {
                    anyhow::bail!(
                        "{}: windows {} and {} overlap or are out of order",
                        day.as_str(),
                        pair[0].window(),
                        pair[1].window()
                    );
                }
            }
        }
        Ok(())
    }

    pub fn open_windows(&self, day: DayOfWeek) -> impl Iterator<Item = TimeWindow> + '_ {
        self.0
            .get(&day)
            .into_iter()
            .flatten()
            .filter(|w| w.available)
            .map(|w| w.window())
    }
}

pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour == 24 && minute == 0 {
        anyhow::bail!("24:00 is not a time of day, the latest closing time is 23:59");
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}

pub fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}
