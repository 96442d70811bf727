//! SQLite-backed implementation of the EventStore port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use signage_core::EventStore;
use signage_domain::{Event, Result, SignageError};
use tracing::{debug, instrument};

use super::{from_ts, SqlitePool};
use crate::errors::{map_pool_error, map_sql_error};

const EVENT_COLUMNS: &str =
    "id, external_key, location_id, start_ts, end_ts, title, lecturers, imported_at, last_seen";

/// SQLite implementation of the event store.
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    let lecturers_json: String = row.get(6)?;
    let lecturers = serde_json::from_str(&lecturers_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Event {
        id: row.get(0)?,
        external_key: row.get(1)?,
        location_id: row.get(2)?,
        start: from_ts(3, row.get(3)?)?,
        end: from_ts(4, row.get(4)?)?,
        title: row.get(5)?,
        lecturers,
        imported_at: from_ts(7, row.get(7)?)?,
        last_seen: from_ts(8, row.get(8)?)?,
    })
}

fn lecturers_json(event: &Event) -> Result<String> {
    serde_json::to_string(&event.lecturers)
        .map_err(|e| SignageError::Database(format!("lecturers serialization: {e}")))
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn get_by_external_key(&self, key: &str) -> Result<Option<Event>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE external_key = ?1"),
            params![key],
            row_to_event,
        )
        .optional()
        .map_err(map_sql_error)
    }

    #[instrument(skip(self, event), fields(external_key = %event.external_key))]
    async fn insert(&self, event: &Event) -> Result<()> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.execute(
            "INSERT INTO events (id, external_key, location_id, start_ts, end_ts, title, lecturers, imported_at, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.id,
                event.external_key,
                event.location_id,
                event.start.timestamp(),
                event.end.timestamp(),
                event.title,
                lecturers_json(event)?,
                event.imported_at.timestamp(),
                event.last_seen.timestamp(),
            ],
        )
        .map_err(map_sql_error)?;
        debug!("inserted event");
        Ok(())
    }

    #[instrument(skip(self, event), fields(external_key = %event.external_key))]
    async fn update(&self, event: &Event) -> Result<()> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let changed = conn
            .execute(
                "UPDATE events
                 SET location_id = ?1, start_ts = ?2, end_ts = ?3, title = ?4,
                     lecturers = ?5, last_seen = ?6
                 WHERE external_key = ?7",
                params![
                    event.location_id,
                    event.start.timestamp(),
                    event.end.timestamp(),
                    event.title,
                    lecturers_json(event)?,
                    event.last_seen.timestamp(),
                    event.external_key,
                ],
            )
            .map_err(map_sql_error)?;
        if changed == 0 {
            return Err(SignageError::NotFound(event.external_key.clone()));
        }
        Ok(())
    }

    async fn touch_last_seen(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let changed = conn
            .execute(
                "UPDATE events SET last_seen = ?1 WHERE external_key = ?2",
                params![at.timestamp(), key],
            )
            .map_err(map_sql_error)?;
        if changed == 0 {
            return Err(SignageError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let deleted = conn
            .execute("DELETE FROM events WHERE external_key = ?1", params![key])
            .map_err(map_sql_error)?;
        Ok(deleted > 0)
    }

    async fn find_spanning(&self, location_id: &str, at: DateTime<Utc>) -> Result<Vec<Event>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events
                 WHERE location_id = ?1 AND start_ts <= ?2 AND end_ts > ?2
                 ORDER BY start_ts"
            ))
            .map_err(map_sql_error)?;
        let events = stmt
            .query_map(params![location_id, at.timestamp()], row_to_event)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        Ok(events)
    }

    async fn find_next_after(
        &self,
        location_id: &str,
        after: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.query_row(
            &format!(
                "SELECT {EVENT_COLUMNS} FROM events
                 WHERE location_id = ?1 AND start_ts > ?2
                 ORDER BY start_ts LIMIT 1"
            ),
            params![location_id, after.timestamp()],
            row_to_event,
        )
        .optional()
        .map_err(map_sql_error)
    }

    async fn find_overlapping(
        &self,
        location_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events
                 WHERE location_id = ?1 AND start_ts < ?2 AND end_ts > ?3
                 ORDER BY start_ts"
            ))
            .map_err(map_sql_error)?;
        let events = stmt
            .query_map(params![location_id, end.timestamp(), start.timestamp()], row_to_event)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn evict_stale(
        &self,
        last_seen_before: DateTime<Utc>,
        end_after: DateTime<Utc>,
    ) -> Result<usize> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let evicted = conn
            .execute(
                "DELETE FROM events WHERE last_seen < ?1 AND end_ts > ?2",
                params![last_seen_before.timestamp(), end_after.timestamp()],
            )
            .map_err(map_sql_error)?;
        if evicted > 0 {
            debug!(count = evicted, "evicted stale events");
        }
        Ok(evicted)
    }

    async fn delete_ended_before(&self, before: DateTime<Utc>) -> Result<usize> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.execute("DELETE FROM events WHERE end_ts < ?1", params![before.timestamp()])
            .map_err(map_sql_error)
    }
}
