use super::*;
use crate::db::repositories::LocalRepository;
use crate::db::repository::{RepositoryResult, StatusRepository, StoreConfigRepository};
use crate::models::{BusinessHoursRule, Observation, StoreStatus, TimezoneAssignment};
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, TimeZone, Weekday};
use std::sync::atomic::{AtomicUsize, Ordering};

fn as_of() -> DateTime<Utc> {
    // Wednesday
    Utc.with_ymd_and_hms(2023, 1, 25, 18, 0, 0).unwrap()
}

fn hourly(store: &str, status: StoreStatus) -> Vec<Observation> {
    (0..=168)
        .map(|h| Observation::new(store, as_of() - Duration::hours(h), status))
        .collect()
}

fn aggregator(repo: &LocalRepository) -> MetricsAggregator {
    MetricsAggregator::new(Arc::new(repo.clone()), TimezoneResolver::default())
        .with_worker_pool_size(2)
}

#[tokio::test]
async fn test_rows_sorted_and_universe_is_observed_stores() {
    let repo = LocalRepository::new();
    repo.add_observations(hourly("c", StoreStatus::Active));
    repo.add_observations(hourly("a", StoreStatus::Inactive));
    repo.add_business_hours(vec![BusinessHoursRule::full_day("hours-only", Weekday::Mon)]);
    repo.set_timezone(TimezoneAssignment::new("tz-only", "Asia/Tokyo"));

    let outcome = aggregator(&repo).generate().await.unwrap();

    let ids: Vec<&str> = outcome.rows.iter().map(|r| r.store_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(outcome.as_of, as_of());
    assert!(outcome.failed_stores.is_empty());

    let a = &outcome.rows[0];
    assert_eq!(a.uptime_last_week_hours, 0.0);
    assert_eq!(a.downtime_last_week_hours, 168.0);
    let c = &outcome.rows[1];
    assert_eq!(c.uptime_last_week_hours, 168.0);
    assert_eq!(c.uptime_last_hour_minutes, 60.0);
}

#[tokio::test]
async fn test_empty_dataset_is_setup_error() {
    let repo = LocalRepository::new();
    assert!(matches!(
        aggregator(&repo).generate().await,
        Err(SetupError::NoObservations)
    ));
}

#[tokio::test]
async fn test_unhealthy_repository_is_setup_error() {
    let repo = LocalRepository::new();
    repo.add_observations(hourly("a", StoreStatus::Active));
    repo.set_healthy(false);

    assert!(matches!(
        aggregator(&repo).generate().await,
        Err(SetupError::AsOf(_))
    ));
}

#[tokio::test]
async fn test_failing_store_gets_zero_row() {
    let repo = LocalRepository::new();
    repo.add_observations(hourly("bad", StoreStatus::Active));
    repo.add_observations(hourly("good", StoreStatus::Active));
    repo.fail_reads_for("bad");

    let outcome = aggregator(&repo).generate().await.unwrap();

    assert_eq!(outcome.failed_stores, vec![StoreId::new("bad")]);
    assert_eq!(outcome.rows[0], StoreReport::zeroed(StoreId::new("bad")));
    assert_eq!(outcome.rows[1].uptime_last_week_hours, 168.0);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|w| w.store_id.as_str() == "bad" && w.kind == crate::models::WarningKind::AllZero));
}

#[tokio::test]
async fn test_unknown_timezone_is_isolated() {
    let repo = LocalRepository::new();
    repo.add_observations(hourly("lost", StoreStatus::Active));
    repo.add_observations(hourly("ok", StoreStatus::Active));
    repo.set_timezone(TimezoneAssignment::new("lost", "Mars/Olympus_Mons"));

    let agg = aggregator(&repo);
    let err = agg
        .compute_store(&StoreId::new("lost"), as_of())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreMetricsError::Timezone { .. }));
    assert_eq!(err.store_id().as_str(), "lost");

    let outcome = agg.generate().await.unwrap();
    assert_eq!(outcome.failed_stores, vec![StoreId::new("lost")]);
}

#[tokio::test]
async fn test_business_hours_and_timezone_applied() {
    let repo = LocalRepository::new();
    // no polls inside the hour, store open 09:00-17:00 New York every day
    repo.add_observations(vec![Observation::new(
        "ny",
        as_of(),
        StoreStatus::Inactive,
    )]);
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
    repo.add_business_hours(
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat, Weekday::Sun]
            .into_iter()
            .map(|d| BusinessHoursRule::new("ny", d, nine, five)),
    );
    repo.set_timezone(TimezoneAssignment::new("ny", "America/New_York"));

    let metrics = aggregator(&repo)
        .compute_store(&StoreId::new("ny"), as_of())
        .await
        .unwrap();

    // as_of is 13:00 local; the single poll sits on the window end
    assert!((metrics.last_hour.business_hours - 1.0).abs() < 1e-9);
    assert_eq!(metrics.last_hour.uptime_hours, 0.0);
    assert!((metrics.last_week.business_hours - 56.0).abs() < 1e-9);
}

/// Wraps a local repository and panics when reading one store.
struct PanickingRepository {
    inner: LocalRepository,
    panic_on: StoreId,
}

#[async_trait]
impl StatusRepository for PanickingRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn observations_for(
        &self,
        store_id: &StoreId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Observation>> {
        if *store_id == self.panic_on {
            panic!("corrupt data for {}", store_id);
        }
        self.inner.observations_for(store_id, start, end).await
    }

    async fn distinct_store_ids(&self) -> RepositoryResult<Vec<StoreId>> {
        self.inner.distinct_store_ids().await
    }

    async fn max_observation_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>> {
        self.inner.max_observation_timestamp().await
    }
}

#[async_trait]
impl StoreConfigRepository for PanickingRepository {
    async fn business_hours_for(
        &self,
        store_id: &StoreId,
    ) -> RepositoryResult<Vec<BusinessHoursRule>> {
        self.inner.business_hours_for(store_id).await
    }

    async fn timezone_for(
        &self,
        store_id: &StoreId,
    ) -> RepositoryResult<Option<TimezoneAssignment>> {
        self.inner.timezone_for(store_id).await
    }
}

#[tokio::test]
async fn test_panicking_store_is_isolated() {
    let inner = LocalRepository::new();
    inner.add_observations(hourly("boom", StoreStatus::Active));
    inner.add_observations(hourly("fine", StoreStatus::Active));
    let repo = PanickingRepository {
        inner,
        panic_on: StoreId::new("boom"),
    };

    let outcome = MetricsAggregator::new(Arc::new(repo), TimezoneResolver::default())
        .generate()
        .await
        .unwrap();

    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows[0], StoreReport::zeroed(StoreId::new("boom")));
    assert_eq!(outcome.rows[1].uptime_last_week_hours, 168.0);
    assert_eq!(outcome.failed_stores, vec![StoreId::new("boom")]);
}

/// Wraps a local repository and records how many reads overlap.
struct CountingRepository {
    inner: LocalRepository,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl StatusRepository for CountingRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn observations_for(
        &self,
        store_id: &StoreId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Observation>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let result = self.inner.observations_for(store_id, start, end).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn distinct_store_ids(&self) -> RepositoryResult<Vec<StoreId>> {
        self.inner.distinct_store_ids().await
    }

    async fn max_observation_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>> {
        self.inner.max_observation_timestamp().await
    }
}

#[async_trait]
impl StoreConfigRepository for CountingRepository {
    async fn business_hours_for(
        &self,
        store_id: &StoreId,
    ) -> RepositoryResult<Vec<BusinessHoursRule>> {
        self.inner.business_hours_for(store_id).await
    }

    async fn timezone_for(
        &self,
        store_id: &StoreId,
    ) -> RepositoryResult<Option<TimezoneAssignment>> {
        self.inner.timezone_for(store_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_pool_bounds_concurrent_stores() {
    let inner = LocalRepository::new();
    for i in 0..40 {
        inner.add_observations(vec![Observation::new(
            format!("store-{:02}", i),
            as_of() - Duration::minutes(i),
            StoreStatus::Active,
        )]);
    }
    let repo = Arc::new(CountingRepository {
        inner,
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    let outcome = MetricsAggregator::new(repo.clone(), TimezoneResolver::default())
        .with_worker_pool_size(3)
        .generate()
        .await
        .unwrap();

    assert_eq!(outcome.rows.len(), 40);
    assert!(outcome.failed_stores.is_empty());
    let peak = repo.peak.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 3, "peak concurrency was {}", peak);
}

#[tokio::test]
async fn test_generate_is_idempotent() {
    let repo = LocalRepository::new();
    repo.add_observations(hourly("a", StoreStatus::Active));
    repo.add_observations(
        (0..50).map(|i| {
            let status = if i % 3 == 0 { StoreStatus::Inactive } else { StoreStatus::Active };
            Observation::new("b", as_of() - Duration::minutes(i * 97), status)
        }),
    );

    let agg = aggregator(&repo);
    let first = agg.generate().await.unwrap();
    let second = agg.generate().await.unwrap();

    assert_eq!(first.rows, second.rows);
}

#[test]
fn test_pool_size_is_at_least_one() {
    let agg = aggregator(&LocalRepository::new()).with_worker_pool_size(0);
    assert_eq!(agg.worker_pool_size(), 1);
}
