//! Fan-out of the uptime interpolator across every observed store.
//!
//! One run freezes a single as-of instant (the latest observation), lists the
//! store universe, then computes each store on its own tokio task through a
//! bounded pool. A store that fails, or whose task panics, gets an all-zero
//! row; only failing to establish the as-of instant or the universe aborts
//! the run.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{
    BusinessHoursCalendar, InvalidTimezone, ObservationTimeline, ReportWindow, StoreId,
    StoreReport, TimezoneResolver, ValidationWarning,
};
use crate::services::uptime::{compute_store_metrics, StoreMetrics};
use crate::services::validation;

/// Default number of stores computed concurrently.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 8;

/// Progress is logged every this many stores.
const PROGRESS_INTERVAL: usize = 100;

/// Fatal errors: the run cannot start.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Failed to read latest observation timestamp: {0}")]
    AsOf(#[source] RepositoryError),

    #[error("Failed to list stores: {0}")]
    StoreUniverse(#[source] RepositoryError),

    #[error("No store status observations available")]
    NoObservations,
}

/// Errors confined to one store; the store gets a zero row.
#[derive(Debug, thiserror::Error)]
pub enum StoreMetricsError {
    #[error("Repository read failed for store {store_id}: {source}")]
    Repository {
        store_id: StoreId,
        #[source]
        source: RepositoryError,
    },

    #[error("Store {store_id}: {source}")]
    Timezone {
        store_id: StoreId,
        #[source]
        source: InvalidTimezone,
    },

    #[error("Computation for store {store_id} panicked: {message}")]
    Panicked { store_id: StoreId, message: String },
}

impl StoreMetricsError {
    fn repository(store_id: &StoreId, source: RepositoryError) -> Self {
        Self::Repository {
            store_id: store_id.clone(),
            source,
        }
    }

    pub fn store_id(&self) -> &StoreId {
        match self {
            Self::Repository { store_id, .. }
            | Self::Timezone { store_id, .. }
            | Self::Panicked { store_id, .. } => store_id,
        }
    }
}

/// Result of one aggregation run.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Frozen end of every window.
    pub as_of: DateTime<Utc>,
    /// One row per observed store, sorted by store id.
    pub rows: Vec<StoreReport>,
    /// Stores that were zero-filled after a failure.
    pub failed_stores: Vec<StoreId>,
    pub diagnostics: Vec<ValidationWarning>,
}

/// Computes report rows for all stores.
#[derive(Clone)]
pub struct MetricsAggregator {
    repository: Arc<dyn FullRepository>,
    resolver: TimezoneResolver,
    worker_pool_size: usize,
}

impl MetricsAggregator {
    pub fn new(repository: Arc<dyn FullRepository>, resolver: TimezoneResolver) -> Self {
        Self {
            repository,
            resolver,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
        }
    }

    /// Set the number of stores computed concurrently (at least one).
    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size.max(1);
        self
    }

    pub fn worker_pool_size(&self) -> usize {
        self.worker_pool_size
    }

    /// Run the whole aggregation.
    pub async fn generate(&self) -> Result<ReportOutcome, SetupError> {
        let as_of = self
            .repository
            .max_observation_timestamp()
            .await
            .map_err(SetupError::AsOf)?
            .ok_or(SetupError::NoObservations)?;

        let stores = self
            .repository
            .distinct_store_ids()
            .await
            .map_err(SetupError::StoreUniverse)?;
        if stores.is_empty() {
            return Err(SetupError::NoObservations);
        }

        let total = stores.len();
        log::info!(
            "Computing uptime for {} stores as of {} ({} workers)",
            total,
            as_of,
            self.worker_pool_size
        );

        let mut results = stream::iter(stores)
            .map(|store_id| {
                let aggregator = self.clone();
                let task_store = store_id.clone();
                let handle = tokio::spawn(async move {
                    aggregator.compute_store(&task_store, as_of).await
                });
                async move { (store_id, handle.await) }
            })
            .buffer_unordered(self.worker_pool_size);

        let mut rows = Vec::with_capacity(total);
        let mut failed_stores = Vec::new();

        while let Some((store_id, joined)) = results.next().await {
            let computed = match joined {
                Ok(result) => result,
                Err(join_err) => Err(StoreMetricsError::Panicked {
                    store_id: store_id.clone(),
                    message: join_err.to_string(),
                }),
            };

            match computed {
                Ok(metrics) => rows.push(metrics.to_report(store_id)),
                Err(err) => {
                    log::warn!("{}; emitting zero row", err);
                    failed_stores.push(store_id.clone());
                    rows.push(StoreReport::zeroed(store_id));
                }
            }

            if rows.len() % PROGRESS_INTERVAL == 0 {
                log::info!("Processed {}/{} stores", rows.len(), total);
            }
        }

        rows.sort_by(|a, b| a.store_id.cmp(&b.store_id));
        failed_stores.sort();

        let diagnostics = validation::validate_rows(&rows);
        log::info!(
            "Computed {} rows ({} failed, {} validation warnings)",
            rows.len(),
            failed_stores.len(),
            diagnostics.len()
        );

        Ok(ReportOutcome {
            as_of,
            rows,
            failed_stores,
            diagnostics,
        })
    }

    /// Unrounded metrics of one store for windows ending at `as_of`.
    pub async fn compute_store(
        &self,
        store_id: &StoreId,
        as_of: DateTime<Utc>,
    ) -> Result<StoreMetrics, StoreMetricsError> {
        let rules = self
            .repository
            .business_hours_for(store_id)
            .await
            .map_err(|e| StoreMetricsError::repository(store_id, e))?;
        let calendar = BusinessHoursCalendar::new(store_id.clone(), rules);

        let assignment = self
            .repository
            .timezone_for(store_id)
            .await
            .map_err(|e| StoreMetricsError::repository(store_id, e))?;
        let tz = self
            .resolver
            .resolve(assignment.as_ref().map(|a| a.timezone_str.as_str()))
            .map_err(|source| StoreMetricsError::Timezone {
                store_id: store_id.clone(),
                source,
            })?;

        // One read covers all three windows
        let week = ReportWindow::LastWeek.bounds(as_of);
        let observations = self
            .repository
            .observations_for(store_id, week.start, week.end)
            .await
            .map_err(|e| StoreMetricsError::repository(store_id, e))?;
        let timeline = ObservationTimeline::new(store_id.clone(), observations);

        Ok(compute_store_metrics(&timeline, &calendar, tz, as_of))
    }
}

#[cfg(test)]
#[path = "metrics_aggregator_tests.rs"]
mod metrics_aggregator_tests;
