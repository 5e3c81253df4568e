//! Store-scoped value types: polls, weekly business-hours rules and timezone assignments.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id_type!(StoreId);

/// State reported by a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub fn is_active(self) -> bool {
        matches!(self, StoreStatus::Active)
    }
}

impl FromStr for StoreStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("Unknown store status: {}", other)),
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStatus::Active => write!(f, "active"),
            StoreStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A single timestamped poll of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub store_id: StoreId,
    pub timestamp_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

impl Observation {
    pub fn new(store_id: impl Into<StoreId>, timestamp_utc: DateTime<Utc>, status: StoreStatus) -> Self {
        Self {
            store_id: store_id.into(),
            timestamp_utc,
            status,
        }
    }
}

/// Last representable second of a local day. A rule closing here is open
/// through the end of that second, i.e. until the next local midnight.
pub(crate) fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Local opening hours of a store for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursRule {
    pub store_id: StoreId,
    pub weekday: Weekday,
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

impl BusinessHoursRule {
    pub fn new(
        store_id: impl Into<StoreId>,
        weekday: Weekday,
        start_time_local: NaiveTime,
        end_time_local: NaiveTime,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            weekday,
            start_time_local,
            end_time_local,
        }
    }

    /// Rule open the whole local day.
    pub fn full_day(store_id: impl Into<StoreId>, weekday: Weekday) -> Self {
        Self::new(store_id, weekday, NaiveTime::MIN, end_of_day())
    }

    /// Build from a Monday=0 day index.
    pub fn from_day_index(
        store_id: impl Into<StoreId>,
        day_of_week: u8,
        start_time_local: NaiveTime,
        end_time_local: NaiveTime,
    ) -> Result<Self, String> {
        let weekday = Weekday::try_from(day_of_week)
            .map_err(|_| format!("day_of_week must be in 0..=6, got {}", day_of_week))?;
        Ok(Self::new(store_id, weekday, start_time_local, end_time_local))
    }

    /// Monday=0 day index.
    pub fn day_index(&self) -> u8 {
        self.weekday.num_days_from_monday() as u8
    }

    /// `end <= start` spans into the next calendar day.
    pub fn is_overnight(&self) -> bool {
        self.end_time_local <= self.start_time_local
    }

    pub fn closes_at_midnight(&self) -> bool {
        self.end_time_local == end_of_day()
    }
}

/// IANA zone assigned to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneAssignment {
    pub store_id: StoreId,
    pub timezone_str: String,
}

impl TimezoneAssignment {
    pub fn new(store_id: impl Into<StoreId>, timezone_str: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            timezone_str: timezone_str.into(),
        }
    }
}
