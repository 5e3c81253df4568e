//! Trailing report windows ending at the frozen as-of instant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of length `span` ending at `end`.
    pub fn trailing(end: DateTime<Utc>, span: Duration) -> Self {
        Self {
            start: end - span,
            end,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The three trailing windows of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportWindow {
    LastHour,
    LastDay,
    LastWeek,
}

impl ReportWindow {
    pub const ALL: [ReportWindow; 3] = [
        ReportWindow::LastHour,
        ReportWindow::LastDay,
        ReportWindow::LastWeek,
    ];

    pub fn span(self) -> Duration {
        match self {
            ReportWindow::LastHour => Duration::hours(1),
            ReportWindow::LastDay => Duration::days(1),
            ReportWindow::LastWeek => Duration::weeks(1),
        }
    }

    /// Bounds of this window for a report frozen at `as_of`.
    pub fn bounds(self, as_of: DateTime<Utc>) -> TimeWindow {
        TimeWindow::trailing(as_of, self.span())
    }

    /// Upper limit of `uptime + downtime` in reporting units
    /// (minutes for the hour, hours otherwise).
    pub fn capacity(self) -> f64 {
        match self {
            ReportWindow::LastHour => 60.0,
            ReportWindow::LastDay => 24.0,
            ReportWindow::LastWeek => 168.0,
        }
    }

    /// Factor converting hours into reporting units.
    pub fn unit_factor(self) -> f64 {
        match self {
            ReportWindow::LastHour => 60.0,
            ReportWindow::LastDay | ReportWindow::LastWeek => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bounds() {
        let as_of = Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22).unwrap();
        let week = ReportWindow::LastWeek.bounds(as_of);
        assert_eq!(week.end, as_of);
        assert_eq!(week.start, Utc.with_ymd_and_hms(2023, 1, 18, 18, 13, 22).unwrap());
        assert_eq!(ReportWindow::LastHour.bounds(as_of).duration(), Duration::hours(1));
    }

    #[test]
    fn test_units() {
        assert_eq!(ReportWindow::LastHour.unit_factor(), 60.0);
        assert_eq!(ReportWindow::LastDay.unit_factor(), 1.0);
        assert_eq!(ReportWindow::LastWeek.capacity(), 168.0);
    }
}
