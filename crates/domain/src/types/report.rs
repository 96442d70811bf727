//! Import cycle reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of persisting one normalized source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Payload identical to the stored event; only `last_seen` was
    /// refreshed.
    Unchanged,
}

/// Counters for one import cycle.
///
/// A failed fetch produces a report with `success = false` and zero
/// mutation counts (fail-static: previous data stays authoritative).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub evicted: usize,
    /// Overlaps resolved deterministically during normalization.
    pub conflicts: usize,
    /// Records dropped because they were malformed.
    pub failed: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            evicted: 0,
            conflicts: 0,
            failed: 0,
            success: true,
            error: None,
        }
    }

    /// Report for a cycle aborted by a source fetch failure.
    pub fn source_failure(started_at: DateTime<Utc>, now: DateTime<Utc>, error: String) -> Self {
        Self {
            finished_at: now,
            success: false,
            error: Some(error),
            ..Self::new(started_at)
        }
    }

    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}
