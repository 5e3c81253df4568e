//! Repository trait for static per-store configuration.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{BusinessHoursRule, StoreId, TimezoneAssignment};

/// Read access to business hours and timezone assignments.
#[async_trait]
pub trait StoreConfigRepository: Send + Sync {
    /// All business-hours rules of `store_id`. Empty means no rules recorded.
    async fn business_hours_for(&self, store_id: &StoreId)
        -> RepositoryResult<Vec<BusinessHoursRule>>;

    /// Timezone assignment of `store_id`, if any.
    async fn timezone_for(&self, store_id: &StoreId)
        -> RepositoryResult<Option<TimezoneAssignment>>;
}
