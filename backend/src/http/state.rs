//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ReportConfig;
use crate::db::repository::FullRepository;
use crate::services::ReportPipeline;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Report generator sharing the same repository
    pub pipeline: Arc<ReportPipeline>,
}

impl AppState {
    /// Create application state, building the report pipeline over `repository`.
    pub fn new(repository: Arc<dyn FullRepository>, config: ReportConfig) -> Self {
        let pipeline = Arc::new(ReportPipeline::new(Arc::clone(&repository), config));
        Self {
            repository,
            pipeline,
        }
    }

    pub fn report_config(&self) -> &ReportConfig {
        self.pipeline.config()
    }
}
