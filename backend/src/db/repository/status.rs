//! Repository trait for poll observations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{Observation, StoreId};

/// Read access to the `store_status` poll table.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across worker tasks.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Observations ====================

    /// Polls of `store_id` with `start <= timestamp_utc <= end`.
    ///
    /// Order is unspecified; callers sort.
    async fn observations_for(
        &self,
        store_id: &StoreId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Observation>>;

    /// Every store id that has at least one observation, without duplicates.
    async fn distinct_store_ids(&self) -> RepositoryResult<Vec<StoreId>>;

    /// Latest observation timestamp across all stores, `None` when empty.
    async fn max_observation_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>>;
}
