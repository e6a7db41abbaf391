#![allow(dead_code)]

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use store_uptime::db::LocalRepository;
use store_uptime::models::{BusinessHourRule, Poll, PollStatus, StoreId};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Wall-clock time in New York on a day of January 2024, as UTC.
pub fn new_york(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    New_York
        .with_ymd_and_hms(2024, 1, day, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Evaluation instant for the Monday scenario: 18:00 in New York.
pub fn scenario_now() -> DateTime<Utc> {
    new_york(15, 18, 0)
}

pub fn weekday_rules(store: StoreId, open: u32, close: u32) -> Vec<BusinessHourRule> {
    (1..=5)
        .map(|day| {
            BusinessHourRule::new(
                store,
                day,
                NaiveTime::from_hms_opt(open, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(close, 0, 0).unwrap(),
            )
            .unwrap()
        })
        .collect()
}

/// Two locations: store 1 open Mon-Fri 09:00-17:00 in New York with four polls
/// on Monday 2024-01-15, and store 2 with only a timezone assignment.
pub fn monday_scenario() -> Arc<LocalRepository> {
    let repo = Arc::new(LocalRepository::new());
    let store = StoreId::new(1);

    repo.set_timezone(store, "America/New_York");
    repo.insert_business_hours(weekday_rules(store, 9, 17));
    repo.insert_polls(vec![
        Poll::new(store, new_york(15, 13, 0), PollStatus::Inactive),
        Poll::new(store, new_york(15, 9, 0), PollStatus::Active),
        Poll::new(store, new_york(15, 17, 0), PollStatus::Active),
        Poll::new(store, new_york(15, 12, 0), PollStatus::Active),
    ]);
    repo.set_timezone(StoreId::new(2), "America/New_York");
    repo
}

/// Expected report rows for [`monday_scenario`] at [`scenario_now`].
pub const MONDAY_SCENARIO_ROWS: &[&str] = &["1,0,0,240,240,240,240", "2,0,0,0,0,0,0"];

/// `count` stores, each with two active polls an hour apart in UTC.
pub fn uniform_fleet(count: i64, now: DateTime<Utc>) -> Arc<LocalRepository> {
    let repo = Arc::new(LocalRepository::new());
    for id in 1..=count {
        let store = StoreId::new(id);
        repo.insert_polls(vec![
            Poll::new(store, now - chrono::Duration::minutes(90), PollStatus::Active),
            Poll::new(store, now - chrono::Duration::minutes(30), PollStatus::Active),
        ]);
    }
    repo
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}
