//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in memory
//! using `HashMap` and `Vec` structures, providing fast, deterministic, and
//! isolated execution.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::db::repository::*;
use crate::models::{
    BusinessHourRule, Poll, ReportId, ReportJob, ReportStatus, StoreDetails, StoreId,
    TimezoneAssignment,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use store_uptime::db::repositories::LocalRepository;
/// use store_uptime::models::{Poll, PollStatus, StoreId};
///
/// let repo = LocalRepository::new();
/// let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
/// repo.insert_polls(vec![Poll::new(StoreId::new(1), at, PollStatus::Active)]);
/// assert_eq!(repo.store_count(), 1);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    polls: HashMap<StoreId, Vec<Poll>>,
    business_hours: HashMap<StoreId, Vec<BusinessHourRule>>,
    timezones: HashMap<StoreId, String>,
    reports: HashMap<ReportId, ReportJob>,

    // Simulated query latency for observation reads
    read_delay: Option<Duration>,

    // Connection health
    is_healthy: bool,

    // Observation reads fail while report writes still succeed
    observations_unavailable: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            polls: HashMap::new(),
            business_hours: HashMap::new(),
            timezones: HashMap::new(),
            reports: HashMap::new(),
            read_delay: None,
            is_healthy: true,
            observations_unavailable: false,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Append polls. Order is irrelevant; the estimator sorts them.
    pub fn insert_polls(&self, polls: impl IntoIterator<Item = Poll>) {
        let mut data = self.data.write();
        for poll in polls {
            data.polls.entry(poll.store_id).or_default().push(poll);
        }
    }

    /// Append business-hour rules.
    pub fn insert_business_hours(&self, rules: impl IntoIterator<Item = BusinessHourRule>) {
        let mut data = self.data.write();
        for rule in rules {
            data.business_hours.entry(rule.store_id).or_default().push(rule);
        }
    }

    /// Assign (or replace) a store's timezone.
    pub fn set_timezone(&self, store_id: StoreId, timezone: impl Into<String>) {
        self.data.write().timezones.insert(store_id, timezone.into());
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make observation reads fail without affecting the job store.
    pub fn set_observations_unavailable(&self, unavailable: bool) {
        self.data.write().observations_unavailable = unavailable;
    }

    /// Delay every observation read, simulating a slow database.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        self.data.write().read_delay = delay;
    }

    /// Number of distinct stores across all observation maps.
    pub fn store_count(&self) -> usize {
        Self::fleet(&self.data.read()).len()
    }

    /// Number of report jobs stored.
    pub fn report_count(&self) -> usize {
        self.data.read().reports.len()
    }

    fn fleet(data: &LocalData) -> BTreeSet<StoreId> {
        data.polls
            .keys()
            .chain(data.business_hours.keys())
            .chain(data.timezones.keys())
            .copied()
            .collect()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }

    /// Health check plus the configured read latency.
    async fn before_read(&self) -> RepositoryResult<()> {
        self.check_health()?;
        if self.data.read().observations_unavailable {
            return Err(RepositoryError::connection_with_context(
                "Observation tables are unavailable",
                ErrorContext::new("read_observations").retryable(),
            ));
        }
        let delay = self.data.read().read_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        // Health may have flipped while we slept
        self.check_health()
    }

    /// Apply a terminal transition to a `Running` job.
    fn finish_report(
        &self,
        report_id: ReportId,
        status: ReportStatus,
        result: Option<String>,
        operation: &str,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        let context = ErrorContext::new(operation)
            .with_entity("report")
            .with_entity_id(report_id);
        let job = data.reports.get_mut(&report_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Report {} not found", report_id),
                context.clone(),
            )
        })?;
        if job.status.is_terminal() {
            return Err(RepositoryError::validation_with_context(
                format!("Report {} already finished as {}", report_id, job.status),
                context,
            ));
        }
        job.status = status;
        job.result = result;
        job.completed_at = Some(Utc::now());
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObservationRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn count_stores(&self) -> RepositoryResult<u64> {
        self.before_read().await?;
        Ok(self.store_count() as u64)
    }

    async fn fetch_store_ids(&self, offset: u64, limit: u64) -> RepositoryResult<Vec<StoreId>> {
        self.before_read().await?;
        let data = self.data.read();
        Ok(Self::fleet(&data)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn fetch_store_details(&self, store_ids: &[StoreId]) -> RepositoryResult<StoreDetails> {
        self.before_read().await?;
        let wanted: HashSet<StoreId> = store_ids.iter().copied().collect();
        let data = self.data.read();

        let mut details = StoreDetails::default();
        for store_id in &wanted {
            if let Some(tz) = data.timezones.get(store_id) {
                details.timezones.push(TimezoneAssignment {
                    store_id: *store_id,
                    timezone: tz.clone(),
                });
            }
            if let Some(rules) = data.business_hours.get(store_id) {
                details.business_hours.extend(rules.iter().copied());
            }
            if let Some(polls) = data.polls.get(store_id) {
                details.polls.extend(polls.iter().copied());
            }
        }
        Ok(details)
    }

    async fn fetch_timezone(&self, store_id: StoreId) -> RepositoryResult<Option<String>> {
        self.before_read().await?;
        Ok(self.data.read().timezones.get(&store_id).cloned())
    }

    async fn fetch_business_hours(
        &self,
        store_id: StoreId,
    ) -> RepositoryResult<Vec<BusinessHourRule>> {
        self.before_read().await?;
        Ok(self
            .data
            .read()
            .business_hours
            .get(&store_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_polls(&self, store_id: StoreId) -> RepositoryResult<Vec<Poll>> {
        self.before_read().await?;
        Ok(self
            .data
            .read()
            .polls
            .get(&store_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReportRepository for LocalRepository {
    async fn create_report(&self, report_id: ReportId) -> RepositoryResult<ReportJob> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.reports.contains_key(&report_id) {
            return Err(RepositoryError::validation_with_context(
                format!("Report {} already exists", report_id),
                ErrorContext::new("create_report")
                    .with_entity("report")
                    .with_entity_id(report_id),
            ));
        }
        let job = ReportJob::running(report_id);
        data.reports.insert(report_id, job.clone());
        Ok(job)
    }

    async fn get_report(&self, report_id: ReportId) -> RepositoryResult<ReportJob> {
        self.check_health()?;
        self.data.read().reports.get(&report_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Report {} not found", report_id),
                ErrorContext::new("get_report")
                    .with_entity("report")
                    .with_entity_id(report_id),
            )
        })
    }

    async fn complete_report(&self, report_id: ReportId, result: String) -> RepositoryResult<()> {
        self.finish_report(report_id, ReportStatus::Complete, Some(result), "complete_report")
    }

    async fn fail_report(&self, report_id: ReportId) -> RepositoryResult<()> {
        self.finish_report(report_id, ReportStatus::Error, None, "fail_report")
    }
}
