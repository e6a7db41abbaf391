//! Persistence for report jobs.
//!
//! A job row is written exactly twice: once on creation (`Running`) and once on
//! its terminal transition. Implementations reject a terminal write for a job
//! that is no longer `Running`, so a stored result never changes.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{ReportId, ReportJob};

/// Repository trait for report job records.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Persist a new job in the `Running` state.
    ///
    /// # Returns
    /// * `Ok(ReportJob)` - The stored record
    /// * `Err(RepositoryError::ValidationError)` - If the id is already taken
    async fn create_report(&self, report_id: ReportId) -> RepositoryResult<ReportJob>;

    /// Look up a job.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no job has this id
    async fn get_report(&self, report_id: ReportId) -> RepositoryResult<ReportJob>;

    /// Transition a `Running` job to `Complete` with its encoded report.
    async fn complete_report(&self, report_id: ReportId, result: String) -> RepositoryResult<()>;

    /// Transition a `Running` job to `Error`. No result is stored.
    async fn fail_report(&self, report_id: ReportId) -> RepositoryResult<()>;
}
