//! Service layer: uptime estimation and the report job pipeline.
//!
//! - [`business_hours`]: interval/business-hour intersection
//! - [`uptime`]: per-window estimation from polls
//! - [`pipeline`]: paginated background report generation
//! - [`reports`]: trigger/status operations used by the HTTP layer
//! - [`report_csv`]: report text encoding

pub mod business_hours;
pub mod error;
pub mod pipeline;
pub mod report_csv;
pub mod reports;
pub mod uptime;

pub use error::{ReportError, ReportResult};
pub use pipeline::{ReportPipeline, ReportProgress};
pub use reports::{get_report, store_uptime, trigger_report, ReportOutcome};
pub use uptime::{aggregate_windows, estimate_window, StoreObservations, TimeWindow};
