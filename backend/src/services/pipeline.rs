//! Background report generation.
//!
//! A run pages through the fleet in id order, bulk-fetches each page's
//! observations, computes every location of the page concurrently and moves
//! on only when the whole page is done. The accumulated rows are encoded and
//! written to the job store in a single terminal update.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinHandle, JoinSet};

use super::error::{ReportError, ReportResult};
use super::report_csv;
use super::uptime::{aggregate_windows, group_store_details};
use crate::config::ReportConfig;
use crate::db::repository::{FullRepository, ObservationRepository, ReportRepository};
use crate::models::{ReportId, ReportStatus, UptimeRecord};

/// Processed/total counter for one run.
#[derive(Debug, Default)]
pub struct ReportProgress {
    processed: AtomicUsize,
    total: AtomicUsize,
}

impl ReportProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Count one finished location, returning the new processed count.
    pub fn record(&self) -> usize {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Whole percent done, capped at 100. An empty fleet counts as done.
    pub fn percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 100;
        }
        ((self.processed() * 100 / total).min(100)) as u8
    }
}

/// Report generator bound to one repository and configuration.
pub struct ReportPipeline {
    repository: Arc<dyn FullRepository>,
    config: ReportConfig,
}

impl ReportPipeline {
    pub fn new(repository: Arc<dyn FullRepository>, config: ReportConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Create a `Running` job and start generating it in the background.
    ///
    /// Returns once the job record exists. The handle resolves when the run
    /// has written its terminal state; callers are free to drop it.
    pub async fn trigger(self: &Arc<Self>) -> ReportResult<(ReportId, JoinHandle<ReportStatus>)> {
        let report_id = ReportId::generate();
        self.repository.create_report(report_id).await?;
        log::info!("Report {} queued", report_id);

        let pipeline = Arc::clone(self);
        let handle = tokio::spawn(async move { pipeline.run(report_id).await });
        Ok((report_id, handle))
    }

    /// Generate the report for an existing `Running` job as of now.
    pub async fn run(&self, report_id: ReportId) -> ReportStatus {
        self.run_at(report_id, Utc::now()).await
    }

    /// Generate the report for an existing `Running` job with a fixed `now`.
    ///
    /// Returns the state the job was left in. That is `Running` only when the
    /// terminal write itself failed.
    pub async fn run_at(&self, report_id: ReportId, now: DateTime<Utc>) -> ReportStatus {
        let started = Instant::now();
        log::info!("Generating report {} as of {}", report_id, now);

        let progress = ReportProgress::new();
        let status = match self.compute(now, &progress).await {
            Ok(records) => {
                let csv = report_csv::encode(&records);
                match self.repository.complete_report(report_id, csv).await {
                    Ok(()) => {
                        log::info!(
                            "Report {} complete: {} stores",
                            report_id,
                            records.len()
                        );
                        ReportStatus::Complete
                    }
                    Err(e) => {
                        log::error!("Failed to store report {}: {}", report_id, e);
                        self.mark_failed(report_id).await
                    }
                }
            }
            Err(e) => {
                log::error!("Error generating report {}: {}", report_id, e);
                self.mark_failed(report_id).await
            }
        };

        log::info!(
            "Report {} finished as {} in {:.2?}",
            report_id,
            status,
            started.elapsed()
        );
        status
    }

    async fn mark_failed(&self, report_id: ReportId) -> ReportStatus {
        match self.repository.fail_report(report_id).await {
            Ok(()) => ReportStatus::Error,
            Err(e) => {
                log::error!("Could not mark report {} as failed: {}", report_id, e);
                ReportStatus::Running
            }
        }
    }

    /// Compute one row per location in the fleet, sorted by store id.
    pub async fn compute(
        &self,
        now: DateTime<Utc>,
        progress: &ReportProgress,
    ) -> ReportResult<Vec<UptimeRecord>> {
        let total = self.repository.count_stores().await?;
        progress.set_total(usize::try_from(total).unwrap_or(usize::MAX));

        let batch = self.config.batch_size.max(1) as u64;
        let fallback = self.config.fallback_timezone;
        let mut offset = 0u64;
        let mut records = Vec::with_capacity(progress.total().min(1 << 16));

        loop {
            let store_ids = self.repository.fetch_store_ids(offset, batch).await?;
            offset += batch;
            let page_len = store_ids.len() as u64;

            if !store_ids.is_empty() {
                let details = self.repository.fetch_store_details(&store_ids).await?;

                let mut tasks = JoinSet::new();
                for observations in group_store_details(&store_ids, details, fallback) {
                    tasks.spawn(async move { aggregate_windows(&observations, now) });
                }

                while let Some(joined) = tasks.join_next().await {
                    let record = joined.map_err(|e| {
                        ReportError::ComputationFailure(format!("store task failed: {}", e))
                    })?;
                    records.push(record);
                    progress.record();
                }

                log::info!(
                    "Generating report {}% ({}/{})",
                    progress.percent(),
                    progress.processed(),
                    progress.total()
                );
            }

            if page_len < batch {
                break;
            }
        }

        records.sort_by_key(|r| r.store_id);
        Ok(records)
    }
}
