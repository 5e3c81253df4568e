//! Service layer: uptime computation and report orchestration.
//!
//! - [`uptime`]: interpolation of polls over business hours
//! - [`metrics_aggregator`]: fan-out across all stores
//! - [`validation`]: advisory sanity checks on finished rows
//! - [`job_tracker`]: in-memory job records
//! - [`report_service`]: trigger/poll lifecycle

pub mod job_tracker;
pub mod metrics_aggregator;
pub mod report_service;
pub mod uptime;
pub mod validation;

pub use job_tracker::{JobTracker, ReportJob};
pub use metrics_aggregator::{
    MetricsAggregator, ReportOutcome, SetupError, StoreMetricsError, DEFAULT_WORKER_POOL_SIZE,
};
pub use report_service::{ReportError, ReportPoll, ReportService};
pub use uptime::{compute_store_metrics, compute_window, StoreMetrics, WindowMetrics};
pub use validation::{validate_row, validate_rows};
