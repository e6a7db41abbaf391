//! Uptime estimation from sparse status polls.
//!
//! Each consecutive pair of polls inside a window contributes the minutes
//! between them. An `active` leading poll books business-hour minutes as
//! uptime and closed minutes as downtime; an `inactive` one books the reverse.
//! Time before the first and after the last poll in the window is not
//! attributed, so totals may be smaller than the window itself.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;

use super::business_hours::business_minutes;
use crate::config::parse_timezone;
use crate::models::{
    BusinessHourRule, Poll, PollStatus, StoreDetails, StoreId, UptimeRecord, WindowUptime,
};

/// Closed time range `[start, end]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[now - length, now]`.
    pub fn trailing(now: DateTime<Utc>, length: Duration) -> Self {
        Self::new(now - length, now)
    }

    pub fn last_hour(now: DateTime<Utc>) -> Self {
        Self::trailing(now, Duration::hours(1))
    }

    pub fn last_day(now: DateTime<Utc>) -> Self {
        Self::trailing(now, Duration::days(1))
    }

    pub fn last_week(now: DateTime<Utc>) -> Self {
        Self::trailing(now, Duration::days(7))
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn length_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }
}

/// Everything the estimator needs for one location.
#[derive(Debug, Clone)]
pub struct StoreObservations {
    pub store_id: StoreId,
    pub timezone: Tz,
    pub business_hours: Vec<BusinessHourRule>,
    /// Sorted ascending by timestamp
    polls: Vec<Poll>,
}

impl StoreObservations {
    pub fn new(
        store_id: StoreId,
        timezone: Tz,
        business_hours: Vec<BusinessHourRule>,
        mut polls: Vec<Poll>,
    ) -> Self {
        polls.sort_by_key(|p| p.timestamp_utc);
        Self {
            store_id,
            timezone,
            business_hours,
            polls,
        }
    }

    pub fn polls(&self) -> &[Poll] {
        &self.polls
    }
}

/// Resolve a stored zone name, using `fallback` when missing or unknown.
pub fn resolve_timezone(store_id: StoreId, name: Option<&str>, fallback: Tz) -> Tz {
    match name {
        None => fallback,
        Some(name) => parse_timezone(name).unwrap_or_else(|e| {
            log::warn!("store {}: {}; using {}", store_id, e, fallback.name());
            fallback
        }),
    }
}

/// Split a page-scoped bulk fetch into per-location inputs, in `store_ids` order.
pub fn group_store_details(
    store_ids: &[StoreId],
    details: StoreDetails,
    fallback: Tz,
) -> Vec<StoreObservations> {
    let mut timezones: HashMap<StoreId, String> = details
        .timezones
        .into_iter()
        .map(|tz| (tz.store_id, tz.timezone))
        .collect();

    let mut rules: HashMap<StoreId, Vec<BusinessHourRule>> = HashMap::new();
    for rule in details.business_hours {
        rules.entry(rule.store_id).or_default().push(rule);
    }

    let mut polls: HashMap<StoreId, Vec<Poll>> = HashMap::new();
    for poll in details.polls {
        polls.entry(poll.store_id).or_default().push(poll);
    }

    store_ids
        .iter()
        .map(|&store_id| {
            let timezone = timezones.remove(&store_id);
            StoreObservations::new(
                store_id,
                resolve_timezone(store_id, timezone.as_deref(), fallback),
                rules.remove(&store_id).unwrap_or_default(),
                polls.remove(&store_id).unwrap_or_default(),
            )
        })
        .collect()
}

/// Estimate uptime and downtime for one location over one window.
///
/// Fewer than two polls inside the window yields zero for both.
pub fn estimate_window(observations: &StoreObservations, window: TimeWindow) -> WindowUptime {
    let in_window: Vec<&Poll> = observations
        .polls
        .iter()
        .filter(|p| window.contains(p.timestamp_utc))
        .collect();

    in_window
        .windows(2)
        .fold(WindowUptime::default(), |mut acc, pair| {
            let minutes = business_minutes(
                pair[0].timestamp_utc,
                pair[1].timestamp_utc,
                &observations.business_hours,
                observations.timezone,
            );
            match pair[0].status {
                PollStatus::Active => {
                    acc.uptime_minutes += minutes.open_minutes;
                    acc.downtime_minutes += minutes.closed_minutes;
                }
                PollStatus::Inactive => {
                    acc.uptime_minutes += minutes.closed_minutes;
                    acc.downtime_minutes += minutes.open_minutes;
                }
            }
            acc
        })
}

/// Last hour, last day and last week ending at `now`.
pub fn aggregate_windows(observations: &StoreObservations, now: DateTime<Utc>) -> UptimeRecord {
    UptimeRecord::from_windows(
        observations.store_id,
        estimate_window(observations, TimeWindow::last_hour(now)),
        estimate_window(observations, TimeWindow::last_day(now)),
        estimate_window(observations, TimeWindow::last_week(now)),
    )
}
