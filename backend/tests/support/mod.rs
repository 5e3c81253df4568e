//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use store_uptime::api::{Observation, ReportId, ReportPoll, ReportService, StoreStatus};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Fixed as-of instant used across fixtures: Wednesday 2023-01-25 18:00 UTC.
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 25, 18, 0, 0).unwrap()
}

/// One poll per hour for the week ending at [`as_of`], all with `status`.
pub fn hourly_observations(store: &str, status: StoreStatus) -> Vec<Observation> {
    (0..=168)
        .map(|h| Observation::new(store, as_of() - Duration::hours(h), status))
        .collect()
}

/// Poll `service` until `id` leaves Running.
pub async fn wait_for_terminal(service: &ReportService, id: &ReportId) -> ReportPoll {
    for _ in 0..1000 {
        match service.poll_report(id) {
            ReportPoll::Running => tokio::time::sleep(StdDuration::from_millis(10)).await,
            other => return other,
        }
    }
    panic!("report {} did not finish", id);
}
