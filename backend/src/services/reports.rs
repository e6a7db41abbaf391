//! Job API operations: trigger a report, look one up, and compute a single
//! location on demand.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::error::{ReportError, ReportResult};
use super::pipeline::ReportPipeline;
use super::uptime::{aggregate_windows, resolve_timezone, StoreObservations};
use crate::config::ReportConfig;
use crate::db::repository::{FullRepository, ReportRepository};
use crate::db::services::fetch_store_snapshot;
use crate::models::{ReportId, ReportJob, ReportStatus, StoreId, UptimeRecord};

/// What a status query reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Running,
    Complete(String),
    Error,
}

impl TryFrom<ReportJob> for ReportOutcome {
    type Error = ReportError;

    fn try_from(job: ReportJob) -> Result<Self, ReportError> {
        match job.status {
            ReportStatus::Running => Ok(ReportOutcome::Running),
            ReportStatus::Error => Ok(ReportOutcome::Error),
            ReportStatus::Complete => job.result.map(ReportOutcome::Complete).ok_or_else(|| {
                ReportError::ComputationFailure(format!(
                    "report {} is complete but has no result",
                    job.report_id
                ))
            }),
        }
    }
}

/// Create a job and start generating it in the background.
pub async fn trigger_report(pipeline: &Arc<ReportPipeline>) -> ReportResult<ReportId> {
    let (report_id, _handle) = pipeline.trigger().await?;
    Ok(report_id)
}

/// Look up a job and shape it for the caller.
pub async fn get_report<R: ReportRepository + ?Sized>(
    repo: &R,
    report_id: ReportId,
) -> ReportResult<ReportOutcome> {
    let job = repo
        .get_report(report_id)
        .await
        .map_err(|e| ReportError::for_report(report_id, e))?;
    ReportOutcome::try_from(job)
}

/// Compute one location's windows ending at `now` without creating a job.
///
/// Returns `None` when no observation table mentions the location.
pub async fn store_uptime<R: FullRepository + ?Sized>(
    repo: &R,
    config: &ReportConfig,
    store_id: StoreId,
    now: DateTime<Utc>,
) -> ReportResult<Option<UptimeRecord>> {
    let snapshot = fetch_store_snapshot(repo, store_id).await?;
    if snapshot.is_unknown() {
        return Ok(None);
    }

    let timezone = resolve_timezone(
        store_id,
        snapshot.timezone.as_deref(),
        config.fallback_timezone,
    );
    let observations =
        StoreObservations::new(store_id, timezone, snapshot.business_hours, snapshot.polls);
    Ok(Some(aggregate_windows(&observations, now)))
}
