//! Observation data: status polls, weekly business-hour rules and timezone assignments.
//!
//! These records are written by the ingestion tooling and are read-only from the
//! point of view of the report pipeline.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id_type!(i64, StoreId);

/// Operational status reported by a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Active,
    Inactive,
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollStatus::Active => "active",
            PollStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("Unknown poll status: {}", other)),
        }
    }
}

/// A single timestamped observation of a store's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub store_id: StoreId,
    pub timestamp_utc: DateTime<Utc>,
    pub status: PollStatus,
}

impl Poll {
    pub fn new(store_id: StoreId, timestamp_utc: DateTime<Utc>, status: PollStatus) -> Self {
        Self {
            store_id,
            timestamp_utc,
            status,
        }
    }
}

/// Highest valid `day_of_week` value. Days are counted from Sunday (0) to Saturday (6).
pub const MAX_DAY_OF_WEEK: u8 = 6;

/// One recurring weekly opening window, expressed in the store's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHourRule {
    pub store_id: StoreId,
    /// 0 = Sunday ... 6 = Saturday
    pub day_of_week: u8,
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

impl BusinessHourRule {
    /// Build a rule, rejecting weekdays outside `0..=6`.
    pub fn new(
        store_id: StoreId,
        day_of_week: u8,
        start_time_local: NaiveTime,
        end_time_local: NaiveTime,
    ) -> Result<Self, String> {
        if day_of_week > MAX_DAY_OF_WEEK {
            return Err(format!(
                "day_of_week must be in 0..={}, got {} for store {}",
                MAX_DAY_OF_WEEK, day_of_week, store_id
            ));
        }
        Ok(Self {
            store_id,
            day_of_week,
            start_time_local,
            end_time_local,
        })
    }
}

/// IANA timezone name assigned to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneAssignment {
    pub store_id: StoreId,
    pub timezone: String,
}

/// Observation data for one page of stores, as returned by a page-scoped bulk fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDetails {
    pub timezones: Vec<TimezoneAssignment>,
    pub business_hours: Vec<BusinessHourRule>,
    pub polls: Vec<Poll>,
}
