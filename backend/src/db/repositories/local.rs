//! In-memory local repository implementation.
//!
//! Holds observations, business hours and timezone assignments in HashMaps
//! keyed by store. It backs the server after CSV ingestion and gives tests a
//! fast, isolated store that can be told to fail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{BusinessHoursRule, Observation, StoreId, TimezoneAssignment};

/// In-memory local repository.
///
/// Cloning is cheap; clones share the same data.
///
/// # Example
/// ```
/// use store_uptime::db::repositories::LocalRepository;
/// use store_uptime::models::{Observation, StoreStatus};
/// use chrono::Utc;
///
/// let repo = LocalRepository::new();
/// repo.add_observations(vec![Observation::new("s1", Utc::now(), StoreStatus::Active)]);
/// assert_eq!(repo.observation_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    observations: HashMap<StoreId, Vec<Observation>>,
    business_hours: HashMap<StoreId, Vec<BusinessHoursRule>>,
    timezones: HashMap<StoreId, TimezoneAssignment>,

    // Stores whose reads fail, for exercising per-store isolation
    failing_stores: HashSet<StoreId>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            observations: HashMap::new(),
            business_hours: HashMap::new(),
            timezones: HashMap::new(),
            failing_stores: HashSet::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append poll observations.
    pub fn add_observations(&self, observations: impl IntoIterator<Item = Observation>) {
        let mut data = self.data.write();
        for obs in observations {
            data.observations
                .entry(obs.store_id.clone())
                .or_default()
                .push(obs);
        }
    }

    /// Append business-hours rules.
    pub fn add_business_hours(&self, rules: impl IntoIterator<Item = BusinessHoursRule>) {
        let mut data = self.data.write();
        for rule in rules {
            data.business_hours
                .entry(rule.store_id.clone())
                .or_default()
                .push(rule);
        }
    }

    /// Set or replace a store's timezone assignment.
    pub fn set_timezone(&self, assignment: TimezoneAssignment) {
        self.data
            .write()
            .timezones
            .insert(assignment.store_id.clone(), assignment);
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make every read concerning `store_id` fail with a query error.
    pub fn fail_reads_for(&self, store_id: impl Into<StoreId>) {
        self.data.write().failing_stores.insert(store_id.into());
    }

    /// Clear all data, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Total number of stored observations.
    pub fn observation_count(&self) -> usize {
        self.data.read().observations.values().map(Vec::len).sum()
    }

    /// Number of stores with at least one business-hours rule.
    pub fn business_hours_store_count(&self) -> usize {
        self.data.read().business_hours.len()
    }

    /// Number of timezone assignments.
    pub fn timezone_count(&self) -> usize {
        self.data.read().timezones.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Repository is not healthy").with_operation(operation));
        }
        Ok(())
    }

    /// Health check plus the per-store failure switch.
    fn check_store(&self, operation: &str, entity: &str, store_id: &StoreId) -> RepositoryResult<()> {
        self.check_health(operation)?;
        if self.data.read().failing_stores.contains(store_id) {
            return Err(RepositoryError::query_with_context(
                "read failed",
                ErrorContext::new(operation)
                    .with_entity(entity)
                    .with_entity_id(store_id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn observations_for(
        &self,
        store_id: &StoreId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Observation>> {
        self.check_store("observations_for", "store_status", store_id)?;

        let data = self.data.read();
        Ok(data
            .observations
            .get(store_id)
            .map(|obs| {
                obs.iter()
                    .filter(|o| o.timestamp_utc >= start && o.timestamp_utc <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn distinct_store_ids(&self) -> RepositoryResult<Vec<StoreId>> {
        self.check_health("distinct_store_ids")?;

        let data = self.data.read();
        let mut ids: Vec<StoreId> = data
            .observations
            .iter()
            .filter(|(_, obs)| !obs.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn max_observation_timestamp(&self) -> RepositoryResult<Option<DateTime<Utc>>> {
        self.check_health("max_observation_timestamp")?;

        let data = self.data.read();
        Ok(data
            .observations
            .values()
            .flatten()
            .map(|o| o.timestamp_utc)
            .max())
    }
}

#[async_trait]
impl StoreConfigRepository for LocalRepository {
    async fn business_hours_for(
        &self,
        store_id: &StoreId,
    ) -> RepositoryResult<Vec<BusinessHoursRule>> {
        self.check_store("business_hours_for", "business_hours", store_id)?;

        Ok(self
            .data
            .read()
            .business_hours
            .get(store_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn timezone_for(
        &self,
        store_id: &StoreId,
    ) -> RepositoryResult<Option<TimezoneAssignment>> {
        self.check_store("timezone_for", "timezone", store_id)?;

        Ok(self.data.read().timezones.get(store_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreStatus;
    use chrono::{TimeZone, Weekday};

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 24, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        assert!(matches!(
            repo.distinct_store_ids().await,
            Err(RepositoryError::ConnectionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_observations_bounds_are_inclusive() {
        let repo = LocalRepository::new();
        repo.add_observations((8..=12).map(|h| Observation::new("s1", ts(h), StoreStatus::Active)));

        let got = repo
            .observations_for(&StoreId::new("s1"), ts(9), ts(11))
            .await
            .unwrap();
        assert_eq!(got.len(), 3);

        let none = repo
            .observations_for(&StoreId::new("other"), ts(0), ts(23))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_store_universe_and_max_timestamp() {
        let repo = LocalRepository::new();
        assert_eq!(repo.max_observation_timestamp().await.unwrap(), None);

        repo.add_observations(vec![
            Observation::new("b", ts(3), StoreStatus::Active),
            Observation::new("a", ts(7), StoreStatus::Inactive),
            Observation::new("b", ts(5), StoreStatus::Active),
        ]);
        repo.add_business_hours(vec![BusinessHoursRule::full_day("hours-only", Weekday::Mon)]);

        let ids = repo.distinct_store_ids().await.unwrap();
        assert_eq!(ids, vec![StoreId::new("a"), StoreId::new("b")]);
        assert_eq!(repo.max_observation_timestamp().await.unwrap(), Some(ts(7)));
    }

    #[tokio::test]
    async fn test_store_config_reads() {
        let repo = LocalRepository::new();
        repo.add_business_hours(vec![BusinessHoursRule::full_day("s1", Weekday::Tue)]);
        repo.set_timezone(TimezoneAssignment::new("s1", "Asia/Tokyo"));

        let s1 = StoreId::new("s1");
        assert_eq!(repo.business_hours_for(&s1).await.unwrap().len(), 1);
        assert_eq!(
            repo.timezone_for(&s1).await.unwrap().map(|a| a.timezone_str),
            Some("Asia/Tokyo".to_string())
        );
        assert!(repo.timezone_for(&StoreId::new("s2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_store_is_isolated() {
        let repo = LocalRepository::new();
        repo.add_observations(vec![
            Observation::new("bad", ts(1), StoreStatus::Active),
            Observation::new("good", ts(1), StoreStatus::Active),
        ]);
        repo.fail_reads_for("bad");

        let err = repo
            .observations_for(&StoreId::new("bad"), ts(0), ts(2))
            .await
            .unwrap_err();
        assert_eq!(err.context().entity_id.as_deref(), Some("bad"));
        assert!(repo
            .observations_for(&StoreId::new("good"), ts(0), ts(2))
            .await
            .is_ok());
        // the store still belongs to the universe
        assert_eq!(repo.distinct_store_ids().await.unwrap().len(), 2);
    }

    #[test]
    fn test_clear_keeps_health() {
        let repo = LocalRepository::new();
        repo.add_observations(vec![Observation::new("s1", ts(1), StoreStatus::Active)]);
        repo.set_healthy(false);
        repo.clear();
        assert_eq!(repo.observation_count(), 0);
        assert!(!repo.data.read().is_healthy);
    }
}
