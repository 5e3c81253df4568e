//! Ordered poll history for one store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{Observation, StoreId, StoreStatus};

/// A poll stripped of its store id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPoint {
    pub timestamp_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

/// Store-scoped observations sorted ascending by timestamp.
///
/// The sort is stable: polls sharing a timestamp keep their arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationTimeline {
    store_id: StoreId,
    points: Vec<StatusPoint>,
}

impl ObservationTimeline {
    /// Build a timeline from raw observations; polls for other stores are dropped.
    pub fn new(store_id: StoreId, observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut points: Vec<StatusPoint> = observations
            .into_iter()
            .filter(|o| o.store_id == store_id)
            .map(|o| StatusPoint {
                timestamp_utc: o.timestamp_utc,
                status: o.status,
            })
            .collect();
        points.sort_by_key(|p| p.timestamp_utc);

        Self { store_id, points }
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    pub fn points(&self) -> &[StatusPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polls with `start <= timestamp <= end`.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[StatusPoint] {
        if start > end {
            return &[];
        }
        let lo = self.points.partition_point(|p| p.timestamp_utc < start);
        let hi = self.points.partition_point(|p| p.timestamp_utc <= end);
        &self.points[lo..hi]
    }
}
