//! Imported campus events and occupancy types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Half-open time window `[start, end)` used for feed queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// A physical location (room) that events occupy and signs are mounted at.
///
/// One location may map to zero or more physical signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    /// Room code as used by the campus system.
    pub room_code: String,
}

/// Normalized event record as produced by the feed collaborator.
///
/// Schema-specific parsing of the campus feed happens behind the
/// `EventSource` port; by the time a record reaches the import pipeline it
/// has this fixed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEvent {
    /// Stable key from the external system of record, unique per event.
    pub external_key: String,
    pub location_id: String,
    pub start: DateTime<Utc>,
    /// Exclusive end timestamp.
    pub end: DateTime<Utc>,
    pub title: String,
    pub lecturers: Vec<String>,
}

impl SourceEvent {
    /// A record violating `start < end` is dropped by the pipeline, not
    /// imported.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }
}

/// An imported event occupying a location for a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Stable external source key, unique across the store.
    pub external_key: String,
    pub location_id: String,
    pub start: DateTime<Utc>,
    /// Exclusive end timestamp. Invariant: `start < end`.
    pub end: DateTime<Utc>,
    pub title: String,
    pub lecturers: Vec<String>,
    pub imported_at: DateTime<Utc>,
    /// Refreshed on every import cycle that re-confirms the event; drives
    /// staleness eviction.
    pub last_seen: DateTime<Utc>,
}

impl Event {
    /// Build a new event from a normalized source record.
    pub fn from_source(source: &SourceEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            external_key: source.external_key.clone(),
            location_id: source.location_id.clone(),
            start: source.start,
            end: source.end,
            title: source.title.clone(),
            lecturers: source.lecturers.clone(),
            imported_at: now,
            last_seen: now,
        }
    }

    /// True when `at` falls inside `[start, end)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// True when the two half-open windows intersect.
    pub fn overlaps(&self, other: &Event) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when the record carries the same payload as this event,
    /// ignoring bookkeeping timestamps. An unchanged record only refreshes
    /// `last_seen`.
    pub fn same_payload(&self, source: &SourceEvent) -> bool {
        self.location_id == source.location_id
            && self.start == source.start
            && self.end == source.end
            && self.title == source.title
            && self.lecturers == source.lecturers
    }

    /// Apply an updated source record, refreshing bookkeeping timestamps.
    pub fn apply_source(&mut self, source: &SourceEvent, now: DateTime<Utc>) {
        self.location_id = source.location_id.clone();
        self.start = source.start;
        self.end = source.end;
        self.title = source.title.clone();
        self.lecturers = source.lecturers.clone();
        self.imported_at = now;
        self.last_seen = now;
    }
}

/// Resolved occupancy of a location at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Event whose window contains the query instant, if any.
    pub current: Option<Event>,
    /// Event with the smallest start after the query instant.
    pub next: Option<Event>,
}
