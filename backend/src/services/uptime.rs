//! Uptime interpolation over business hours.
//!
//! Turns sparse polls into continuous uptime estimates for a trailing window.
//! The window is walked one store-local calendar day at a time; each day's
//! business-hours segments are intersected with the window and the polls
//! inside a segment are forward-filled as a right-open step function:
//!
//! ```text
//!   segment   |=============================================|
//!   polls           A           I                 A
//!   filled    |AAAAAAAAAAAAAAAAAIIIIIIIIIIIIIIIIIIIAAAAAAAAAA|
//! ```
//!
//! The first poll's status is extended back to the segment start and the last
//! poll's status forward to the segment end. A segment without polls counts
//! as fully up.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{
    round2, BusinessHoursCalendar, BusinessHoursRule, ObservationTimeline, ReportWindow,
    StoreId, StoreReport, StoreStatus, TimeWindow,
};

/// Uptime and business hours accumulated over one window, in hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub uptime_hours: f64,
    pub business_hours: f64,
}

impl WindowMetrics {
    /// Business hours not covered by uptime, floored at zero.
    pub fn downtime_hours(&self) -> f64 {
        (self.business_hours - self.uptime_hours).max(0.0)
    }
}

/// Unrounded metrics for the three report windows of one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMetrics {
    pub last_hour: WindowMetrics,
    pub last_day: WindowMetrics,
    pub last_week: WindowMetrics,
}

impl StoreMetrics {
    pub fn window(&self, window: ReportWindow) -> &WindowMetrics {
        match window {
            ReportWindow::LastHour => &self.last_hour,
            ReportWindow::LastDay => &self.last_day,
            ReportWindow::LastWeek => &self.last_week,
        }
    }

    /// Output row: hour in minutes, day and week in hours, rounded once.
    pub fn to_report(&self, store_id: StoreId) -> StoreReport {
        let up = |w: ReportWindow| round2(self.window(w).uptime_hours * w.unit_factor());
        let down = |w: ReportWindow| round2(self.window(w).downtime_hours() * w.unit_factor());

        StoreReport {
            store_id,
            uptime_last_hour_minutes: up(ReportWindow::LastHour),
            uptime_last_day_hours: up(ReportWindow::LastDay),
            uptime_last_week_hours: up(ReportWindow::LastWeek),
            downtime_last_hour_minutes: down(ReportWindow::LastHour),
            downtime_last_day_hours: down(ReportWindow::LastDay),
            downtime_last_week_hours: down(ReportWindow::LastWeek),
        }
    }
}

/// Compute all three windows ending at `as_of`.
///
/// `timeline` should cover at least the trailing week; it is shared by the
/// three windows.
pub fn compute_store_metrics(
    timeline: &ObservationTimeline,
    calendar: &BusinessHoursCalendar,
    tz: Tz,
    as_of: DateTime<Utc>,
) -> StoreMetrics {
    StoreMetrics {
        last_hour: compute_window(timeline, calendar, tz, ReportWindow::LastHour.bounds(as_of)),
        last_day: compute_window(timeline, calendar, tz, ReportWindow::LastDay.bounds(as_of)),
        last_week: compute_window(timeline, calendar, tz, ReportWindow::LastWeek.bounds(as_of)),
    }
}

/// Uptime and business hours of one store inside `window`.
pub fn compute_window(
    timeline: &ObservationTimeline,
    calendar: &BusinessHoursCalendar,
    tz: Tz,
    window: TimeWindow,
) -> WindowMetrics {
    let mut totals = WindowMetrics::default();
    if window.is_empty() {
        return totals;
    }

    let mut day = window.start.with_timezone(&tz).date_naive();
    let last_day = window.end.with_timezone(&tz).date_naive();

    while day <= last_day {
        let Some(next_day) = day.succ_opt() else {
            break;
        };

        let lo = window.start.max(local_midnight(tz, day));
        let hi = window.end.min(local_midnight(tz, next_day));

        if lo < hi {
            for (seg_start, seg_end) in business_segments(calendar, tz, day, lo, hi) {
                accumulate_segment(timeline, seg_start, seg_end, &mut totals);
            }
        }

        day = next_day;
    }

    totals
}

/// Business segments of local `day`, clipped to `[lo, hi)`.
///
/// Both the day's own rule and the overnight tail of the previous day's rule
/// can open the store on `day`; overlapping spans are merged.
fn business_segments(
    calendar: &BusinessHoursCalendar,
    tz: Tz,
    day: NaiveDate,
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(2);

    for anchor in [day.pred_opt(), Some(day)].into_iter().flatten() {
        let Some(rule) = calendar.rule_for(anchor.weekday()) else {
            continue;
        };
        let Some((start, end)) = rule_span(rule, tz, anchor) else {
            continue;
        };
        let start = start.max(lo);
        let end = end.min(hi);
        if start < end {
            spans.push((start, end));
        }
    }

    spans.sort_by_key(|s| s.0);
    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// UTC span of `rule` anchored on local date `anchor`.
fn rule_span(
    rule: &BusinessHoursRule,
    tz: Tz,
    anchor: NaiveDate,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_instant(tz, anchor.and_time(rule.start_time_local));

    let mut end_date = anchor;
    if rule.is_overnight() {
        end_date = end_date.succ_opt()?;
    }
    let end = if rule.closes_at_midnight() {
        local_midnight(tz, end_date.succ_opt()?)
    } else {
        local_instant(tz, end_date.and_time(rule.end_time_local))
    };

    Some((start, end))
}

fn accumulate_segment(
    timeline: &ObservationTimeline,
    seg_start: DateTime<Utc>,
    seg_end: DateTime<Utc>,
    totals: &mut WindowMetrics,
) {
    let segment_hours = hours(seg_end - seg_start);
    totals.business_hours += segment_hours;

    let polls = timeline.between(seg_start, seg_end);
    let (Some(first), Some(last)) = (polls.first(), polls.last()) else {
        totals.uptime_hours += segment_hours;
        return;
    };

    let mut points: Vec<(DateTime<Utc>, StoreStatus)> = Vec::with_capacity(polls.len() + 2);
    if first.timestamp_utc > seg_start {
        points.push((seg_start, first.status));
    }
    points.extend(polls.iter().map(|p| (p.timestamp_utc, p.status)));
    if last.timestamp_utc < seg_end {
        points.push((seg_end, last.status));
    }

    for pair in points.windows(2) {
        let (t0, status) = pair[0];
        let (t1, _) = pair[1];
        if status.is_active() {
            totals.uptime_hours += hours(t1 - t0);
        }
    }
}

/// Duration in fractional hours.
pub(crate) fn hours(d: Duration) -> f64 {
    d.num_seconds() as f64 / 3600.0 + f64::from(d.subsec_nanos()) / 3.6e12
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    local_instant(tz, date.and_time(NaiveTime::MIN))
}

/// Map a wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// DST gap are shifted forward by the length of the gap.
pub(crate) fn local_instant(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(a, b) => a.min(b).with_timezone(&Utc),
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix()
                .local_minus_utc();
            Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(before))))
        }
    }
}

#[cfg(test)]
#[path = "uptime_tests.rs"]
mod uptime_tests;
