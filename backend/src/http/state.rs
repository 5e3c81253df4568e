//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::ReportService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance, used by the health check
    pub repository: Arc<dyn FullRepository>,
    /// Report job lifecycle
    pub reports: ReportService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(repository: Arc<dyn FullRepository>, reports: ReportService) -> Self {
        Self {
            repository,
            reports,
        }
    }
}
