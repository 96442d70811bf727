//! Occupancy resolver - current and next event per location
//!
//! Answers "what is happening in this room right now, and what comes
//! next" from the imported event set. Event windows are half-open, so
//! back-to-back events never count as simultaneously current.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use signage_domain::{Occupancy, Result};
use tracing::warn;

use crate::import::ports::EventStore;

/// Resolves the occupancy of a location at a point in time.
pub struct OccupancyResolver {
    store: Arc<dyn EventStore>,
}

impl OccupancyResolver {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Resolve the current and next event for a location.
    ///
    /// When multiple stored events claim the same moment (a data defect
    /// the import should have resolved), the one with the earliest start
    /// wins and the conflict is logged.
    pub async fn resolve(&self, location_id: &str, at: DateTime<Utc>) -> Result<Occupancy> {
        let mut spanning = self.store.find_spanning(location_id, at).await?;
        spanning.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.external_key.cmp(&b.external_key)));

        if spanning.len() > 1 {
            let keys: Vec<&str> = spanning.iter().map(|e| e.external_key.as_str()).collect();
            warn!(
                location = %location_id,
                events = ?keys,
                "multiple events claim the same slot; earliest start wins"
            );
        }

        let current = spanning.into_iter().next();
        let next = self.store.find_next_after(location_id, at).await?;

        Ok(Occupancy { current, next })
    }
}
