//! Sanity checks on finished report rows.
//!
//! Checks are advisory: they produce [`ValidationWarning`]s that are attached
//! to the job diagnostics and never change the job outcome.
//!
//! Rules:
//! - Hourly uptime + downtime should be 60 minutes
//! - Daily and weekly totals must not exceed the window length
//! - No negative values
//! - Not every value exactly zero

use crate::models::{ReportWindow, StoreReport, ValidationWarning, WarningKind};

/// Allowed slack on window totals, in reporting units.
pub const TOTAL_TOLERANCE: f64 = 0.1;

/// Validate a single report row.
///
/// Returns every violated rule; an empty vector means the row looks sane.
pub fn validate_row(row: &StoreReport) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |kind: WarningKind, message: String| ValidationWarning {
        store_id: row.store_id.clone(),
        kind,
        message,
    };

    // === Window totals ===

    let hour_total = row.uptime_last_hour_minutes + row.downtime_last_hour_minutes;
    let hour_capacity = ReportWindow::LastHour.capacity();
    if (hour_total - hour_capacity).abs() > TOTAL_TOLERANCE {
        warnings.push(warn(
            WarningKind::HourlyTotalMismatch,
            format!(
                "Last hour totals {:.2} minutes, expected {:.0}",
                hour_total, hour_capacity
            ),
        ));
    }

    let day_total = row.uptime_last_day_hours + row.downtime_last_day_hours;
    let day_capacity = ReportWindow::LastDay.capacity();
    if day_total > day_capacity + TOTAL_TOLERANCE {
        warnings.push(warn(
            WarningKind::DailyTotalExceeded,
            format!("Last day totals {:.2} hours, above {:.0}", day_total, day_capacity),
        ));
    }

    let week_total = row.uptime_last_week_hours + row.downtime_last_week_hours;
    let week_capacity = ReportWindow::LastWeek.capacity();
    if week_total > week_capacity + TOTAL_TOLERANCE {
        warnings.push(warn(
            WarningKind::WeeklyTotalExceeded,
            format!("Last week totals {:.2} hours, above {:.0}", week_total, week_capacity),
        ));
    }

    // === Value checks ===

    let values = row.values();
    if values.iter().any(|v| *v < 0.0) {
        warnings.push(warn(
            WarningKind::NegativeValue,
            "Report row contains a negative value".to_string(),
        ));
    }

    if values.iter().all(|v| *v == 0.0) {
        warnings.push(warn(
            WarningKind::AllZero,
            "All uptime and downtime values are zero".to_string(),
        ));
    }

    warnings
}

/// Validate every row, logging each warning at debug level.
pub fn validate_rows(rows: &[StoreReport]) -> Vec<ValidationWarning> {
    let warnings: Vec<ValidationWarning> = rows.iter().flat_map(validate_row).collect();
    for w in &warnings {
        log::debug!("Validation warning for store {}: {}", w.store_id, w.message);
    }
    warnings
}
