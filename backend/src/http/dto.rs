//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::services::ReportOutcome;

/// Response for `POST /trigger_report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    pub report_id: String,
}

/// Body of `GET /get_report`.
///
/// The id stays a string here so a malformed value becomes a 400 with a
/// useful message instead of a generic body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetReportRequest {
    pub report_id: String,
}

/// Response for `GET /get_report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ReportStatusResponse {
    Running,
    Complete { report: String },
    Error,
}

impl From<ReportOutcome> for ReportStatusResponse {
    fn from(outcome: ReportOutcome) -> Self {
        match outcome {
            ReportOutcome::Running => Self::Running,
            ReportOutcome::Complete(report) => Self::Complete { report },
            ReportOutcome::Error => Self::Error,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Crate version
    pub version: String,
    /// Database connection status
    pub database: String,
}
