//! Public API surface of the crate.
//!
//! Consolidates the types an embedding application needs: value types,
//! repository traits, the report service and its answers.

pub use crate::config::{ConfigError, Settings};
pub use crate::db::repository::{
    ErrorContext, FullRepository, RepositoryError, RepositoryResult, StatusRepository,
    StoreConfigRepository,
};
pub use crate::db::{InMemorySink, LocalRepository, ReportSink, SinkError};
#[cfg(feature = "csv")]
pub use crate::db::CsvReportSink;
pub use crate::models::{
    BusinessHoursCalendar, BusinessHoursRule, Observation, ObservationTimeline, ReportId,
    ReportStatus, ReportWindow, StoreId, StoreReport, StoreStatus, TimeWindow,
    TimezoneAssignment, TimezoneResolver, ValidationWarning, WarningKind, REPORT_COLUMNS,
};
pub use crate::services::{
    MetricsAggregator, ReportError, ReportOutcome, ReportPoll, ReportService, SetupError,
    StoreMetrics, StoreMetricsError, WindowMetrics,
};
