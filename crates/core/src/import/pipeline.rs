//! Import pipeline - periodic synchronization of campus events
//!
//! One `sync` call fetches all records valid in the configured window,
//! normalizes them (dedup, overlap resolution), upserts them into the
//! event store and evicts events no longer confirmed by the source.
//!
//! Failure handling is fail-static: a fetch failure aborts the cycle
//! without mutating the store, and the previous data remains authoritative
//! until the next successful cycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use signage_domain::{Event, ImportConfig, Result, SourceEvent, SyncReport, TimeWindow, UpsertOutcome};
use tracing::{debug, info, instrument, warn};

use super::ports::{EventSource, EventStore};

/// Periodic import of event/lecturer records from the campus system.
pub struct ImportPipeline {
    source: Arc<dyn EventSource>,
    store: Arc<dyn EventStore>,
    config: ImportConfig,
}

impl ImportPipeline {
    /// Create a new pipeline over the given source and store.
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<dyn EventStore>,
        config: ImportConfig,
    ) -> Self {
        Self { source, store, config }
    }

    /// Run one import cycle.
    ///
    /// Returns a report with mutation counts. A source fetch failure
    /// produces a report with `success = false` and no store mutations;
    /// storage failures abort the cycle with an error (retried on the
    /// next tick).
    #[instrument(skip(self))]
    pub async fn sync(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        let mut report = SyncReport::new(now);
        let window = TimeWindow::new(
            now - Duration::hours(self.config.window_past_hours),
            now + Duration::days(self.config.window_future_days),
        );

        let records = match self.source.fetch_events(window).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "event source fetch failed; previous data stays authoritative");
                return Ok(SyncReport::source_failure(now, Utc::now(), e.to_string()));
            }
        };

        debug!(count = records.len(), "fetched event records");
        let batch = normalize_batch(records, &mut report);

        for record in &batch {
            let outcome = self.upsert_record(record, now).await?;
            report.record(outcome);
            self.supersede_overlaps(record, &mut report).await?;
        }

        let stale_before = now - Duration::hours(self.config.staleness_threshold_hours);
        report.evicted += self.store.evict_stale(stale_before, now).await?;

        let retention_cutoff = now - Duration::days(self.config.retention_days);
        let cleaned = self.store.delete_ended_before(retention_cutoff).await?;
        if cleaned > 0 {
            debug!(count = cleaned, "removed events past retention");
        }

        report.finished_at = Utc::now();
        info!(
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            evicted = report.evicted,
            conflicts = report.conflicts,
            failed = report.failed,
            "import cycle completed"
        );
        Ok(report)
    }

    async fn upsert_record(&self, record: &SourceEvent, now: DateTime<Utc>) -> Result<UpsertOutcome> {
        match self.store.get_by_external_key(&record.external_key).await? {
            Some(existing) if existing.same_payload(record) => {
                self.store.touch_last_seen(&record.external_key, now).await?;
                Ok(UpsertOutcome::Unchanged)
            }
            Some(mut existing) => {
                existing.apply_source(record, now);
                self.store.update(&existing).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.store.insert(&Event::from_source(record, now)).await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Remove stored events overlapping a freshly imported record.
    ///
    /// Overlaps between the feed and older store contents are resolved by
    /// most-recently-imported wins; the superseded event is removed and
    /// the conflict logged as a data-quality warning.
    async fn supersede_overlaps(&self, record: &SourceEvent, report: &mut SyncReport) -> Result<()> {
        let overlapping =
            self.store.find_overlapping(&record.location_id, record.start, record.end).await?;
        for event in overlapping {
            if event.external_key == record.external_key {
                continue;
            }
            warn!(
                superseded = %event.external_key,
                winner = %record.external_key,
                location = %record.location_id,
                "overlapping stored event superseded by most recent import"
            );
            self.store.delete(&event.external_key).await?;
            report.conflicts += 1;
        }
        Ok(())
    }
}

fn windows_overlap(a: &SourceEvent, b: &SourceEvent) -> bool {
    a.location_id == b.location_id && a.start < b.end && b.start < a.end
}

/// Normalize one fetched batch: drop malformed records, deduplicate by
/// external key (last occurrence wins) and resolve in-batch overlaps per
/// location (the record imported later wins the conflicting window).
fn normalize_batch(records: Vec<SourceEvent>, report: &mut SyncReport) -> Vec<SourceEvent> {
    let mut batch: Vec<SourceEvent> = Vec::with_capacity(records.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for record in records {
        if !record.is_well_formed() {
            warn!(
                external_key = %record.external_key,
                "dropping malformed source record (start is not before end)"
            );
            report.failed += 1;
            continue;
        }
        match by_key.get(&record.external_key) {
            Some(&idx) => batch[idx] = record,
            None => {
                by_key.insert(record.external_key.clone(), batch.len());
                batch.push(record);
            }
        }
    }

    // In-batch overlap resolution: a later record beats every earlier one
    // it intersects with.
    let mut dropped = vec![false; batch.len()];
    for later in 1..batch.len() {
        for earlier in 0..later {
            if dropped[earlier] || dropped[later] {
                continue;
            }
            if windows_overlap(&batch[earlier], &batch[later]) {
                warn!(
                    superseded = %batch[earlier].external_key,
                    winner = %batch[later].external_key,
                    location = %batch[later].location_id,
                    "overlapping source records; most recently imported wins"
                );
                dropped[earlier] = true;
                report.conflicts += 1;
            }
        }
    }

    batch
        .into_iter()
        .zip(dropped)
        .filter_map(|(record, drop)| if drop { None } else { Some(record) })
        .collect()
}
