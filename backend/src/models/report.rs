//! Report rows, job status and advisory diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::store::StoreId;

crate::define_id_type!(ReportId);

impl ReportId {
    /// Fresh random id.
    pub fn generate() -> Self {
        ReportId(uuid::Uuid::new_v4().to_string())
    }
}

/// Output column names, in order.
pub const REPORT_COLUMNS: [&str; 7] = [
    "store_id",
    "uptime_last_hour_minutes",
    "uptime_last_day_hours",
    "uptime_last_week_hours",
    "downtime_last_hour_minutes",
    "downtime_last_day_hours",
    "downtime_last_week_hours",
];

/// Round to two decimals. Applied once, to final output values.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One output row. Hour figures are in minutes, day and week figures in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReport {
    pub store_id: StoreId,
    pub uptime_last_hour_minutes: f64,
    pub uptime_last_day_hours: f64,
    pub uptime_last_week_hours: f64,
    pub downtime_last_hour_minutes: f64,
    pub downtime_last_day_hours: f64,
    pub downtime_last_week_hours: f64,
}

impl StoreReport {
    /// Row emitted for a store whose metrics could not be computed.
    pub fn zeroed(store_id: StoreId) -> Self {
        Self {
            store_id,
            uptime_last_hour_minutes: 0.0,
            uptime_last_day_hours: 0.0,
            uptime_last_week_hours: 0.0,
            downtime_last_hour_minutes: 0.0,
            downtime_last_day_hours: 0.0,
            downtime_last_week_hours: 0.0,
        }
    }

    /// The six numeric fields in column order.
    pub fn values(&self) -> [f64; 6] {
        [
            self.uptime_last_hour_minutes,
            self.uptime_last_day_hours,
            self.uptime_last_week_hours,
            self.downtime_last_hour_minutes,
            self.downtime_last_day_hours,
            self.downtime_last_week_hours,
        ]
    }
}

/// Lifecycle state of a report job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Running,
    Complete,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReportStatus::Running)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Running => write!(f, "Running"),
            ReportStatus::Complete => write!(f, "Complete"),
            ReportStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Category of a sanity-check violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    HourlyTotalMismatch,
    DailyTotalExceeded,
    WeeklyTotalExceeded,
    NegativeValue,
    AllZero,
}

/// Advisory diagnostic attached to a completed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub store_id: StoreId,
    pub kind: WarningKind,
    pub message: String,
}
