//! Port interfaces for event import and storage
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signage_domain::{Event, Result, SourceEvent, TimeWindow};

/// Read-only feed of event records from the external campus system.
///
/// Implementations own the wire schema and produce normalized records;
/// transport failures surface as `SignageError::SourceUnavailable`.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch all records valid within the given time window.
    async fn fetch_events(&self, window: TimeWindow) -> Result<Vec<SourceEvent>>;
}

/// Durable repository of imported events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Look up an event by its stable external key.
    async fn get_by_external_key(&self, key: &str) -> Result<Option<Event>>;

    /// Insert a new event.
    async fn insert(&self, event: &Event) -> Result<()>;

    /// Update an existing event in place.
    async fn update(&self, event: &Event) -> Result<()>;

    /// Refresh the last-seen timestamp without touching the payload.
    async fn touch_last_seen(&self, key: &str, at: DateTime<Utc>) -> Result<()>;

    /// Delete by external key. Returns true when a row was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Events at a location whose window contains `at`.
    async fn find_spanning(&self, location_id: &str, at: DateTime<Utc>) -> Result<Vec<Event>>;

    /// The event at a location with the smallest start strictly after
    /// `after`.
    async fn find_next_after(
        &self,
        location_id: &str,
        after: DateTime<Utc>,
    ) -> Result<Option<Event>>;

    /// Events at a location intersecting the half-open window
    /// `[start, end)`.
    async fn find_overlapping(
        &self,
        location_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    /// Remove events not re-confirmed since `last_seen_before` whose
    /// window has not ended by `end_after`. Returns the eviction count.
    async fn evict_stale(
        &self,
        last_seen_before: DateTime<Utc>,
        end_after: DateTime<Utc>,
    ) -> Result<usize>;

    /// Remove events whose window ended before `before`. Returns the
    /// number of rows removed.
    async fn delete_ended_before(&self, before: DateTime<Utc>) -> Result<usize>;
}
