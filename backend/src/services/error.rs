//! Report service errors.

use crate::db::repository::RepositoryError;
use crate::models::ReportId;

/// Failures surfaced by the report services.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Observation or job store unreachable, or a query failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] RepositoryError),

    /// Status lookup for a job id that was never created.
    #[error("report {0} not found")]
    JobNotFound(ReportId),

    /// Stored data could not be interpreted.
    #[error("computation failed: {0}")]
    ComputationFailure(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl ReportError {
    /// Map a repository error raised while looking up `report_id`.
    pub fn for_report(report_id: ReportId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::JobNotFound(report_id),
            other => Self::from(other),
        }
    }
}

impl From<RepositoryError> for ReportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ValidationError { message, .. } => Self::ComputationFailure(message),
            other => Self::StorageUnavailable(other),
        }
    }
}
