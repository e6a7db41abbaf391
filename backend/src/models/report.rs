//! Report job records and per-store report rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::StoreId;

crate::define_id_type!(Uuid, ReportId);

impl ReportId {
    /// Allocate a fresh random report id.
    pub fn generate() -> Self {
        ReportId(Uuid::new_v4())
    }
}

/// Lifecycle of a report job: `Running` moves once to `Complete` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Running,
    Complete,
    Error,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Running => "Running",
            ReportStatus::Complete => "Complete",
            ReportStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Running)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Running" => Ok(Self::Running),
            "Complete" => Ok(Self::Complete),
            "Error" => Ok(Self::Error),
            other => Err(format!("Unknown report status: {}", other)),
        }
    }
}

/// Persisted report job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportJob {
    pub report_id: ReportId,
    pub status: ReportStatus,
    /// Encoded csv report, present only once the job is `Complete`.
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReportJob {
    /// A freshly created job in the `Running` state.
    pub fn running(report_id: ReportId) -> Self {
        Self {
            report_id,
            status: ReportStatus::Running,
            result: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Uptime and downtime minutes for one trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUptime {
    pub uptime_minutes: i64,
    pub downtime_minutes: i64,
}

impl WindowUptime {
    pub fn new(uptime_minutes: i64, downtime_minutes: i64) -> Self {
        Self {
            uptime_minutes,
            downtime_minutes,
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.uptime_minutes + self.downtime_minutes
    }
}

/// One report row: uptime/downtime for the last hour, day and week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeRecord {
    pub store_id: StoreId,
    pub uptime_last_hour: i64,
    pub downtime_last_hour: i64,
    pub uptime_last_day: i64,
    pub downtime_last_day: i64,
    pub uptime_last_week: i64,
    pub downtime_last_week: i64,
}

impl UptimeRecord {
    pub fn from_windows(
        store_id: StoreId,
        last_hour: WindowUptime,
        last_day: WindowUptime,
        last_week: WindowUptime,
    ) -> Self {
        Self {
            store_id,
            uptime_last_hour: last_hour.uptime_minutes,
            downtime_last_hour: last_hour.downtime_minutes,
            uptime_last_day: last_day.uptime_minutes,
            downtime_last_day: last_day.downtime_minutes,
            uptime_last_week: last_week.uptime_minutes,
            downtime_last_week: last_week.downtime_minutes,
        }
    }

    /// A row with every window at zero minutes.
    pub fn empty(store_id: StoreId) -> Self {
        Self::from_windows(
            store_id,
            WindowUptime::default(),
            WindowUptime::default(),
            WindowUptime::default(),
        )
    }
}
