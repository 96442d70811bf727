//! SQLite-backed implementation of the DisplayRepository port.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use signage_core::DisplayRepository;
use signage_domain::{ActualState, Display, Result, SignageError};
use tracing::debug;

use super::{from_ts, SqlitePool};
use crate::errors::{map_pool_error, map_sql_error};

const DISPLAY_COLUMNS: &str =
    "id, name, address, location_id, enabled, last_power, last_content_id, last_reported_at";

/// SQLite implementation of the display repository.
pub struct SqliteDisplayRepository {
    pool: SqlitePool,
}

impl SqliteDisplayRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_display(row: &Row<'_>) -> rusqlite::Result<Display> {
    let last_power: Option<bool> = row.get(5)?;
    let last_reported_at: Option<i64> = row.get(7)?;
    let last_reported = match (last_power, last_reported_at) {
        (Some(power), Some(ts)) => Some(ActualState {
            power,
            content_id: row.get(6)?,
            reported_at: from_ts(7, ts)?,
        }),
        _ => None,
    };
    Ok(Display {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        location_id: row.get(3)?,
        enabled: row.get(4)?,
        last_reported,
    })
}

#[async_trait]
impl DisplayRepository for SqliteDisplayRepository {
    async fn list_enabled(&self) -> Result<Vec<Display>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {DISPLAY_COLUMNS} FROM displays WHERE enabled = 1"))
            .map_err(map_sql_error)?;
        let displays = stmt
            .query_map([], row_to_display)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        Ok(displays)
    }

    async fn get(&self, id: &str) -> Result<Option<Display>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.query_row(
            &format!("SELECT {DISPLAY_COLUMNS} FROM displays WHERE id = ?1"),
            params![id],
            row_to_display,
        )
        .optional()
        .map_err(map_sql_error)
    }

    async fn upsert(&self, display: &Display) -> Result<()> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let last = display.last_reported.as_ref();
        conn.execute(
            "INSERT INTO displays (id, name, address, location_id, enabled, last_power,
                                   last_content_id, last_reported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 address = excluded.address,
                 location_id = excluded.location_id,
                 enabled = excluded.enabled",
            params![
                display.id,
                display.name,
                display.address,
                display.location_id,
                display.enabled,
                last.map(|s| s.power),
                last.and_then(|s| s.content_id.clone()),
                last.map(|s| s.reported_at.timestamp()),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    async fn update_reported_state(&self, display_id: &str, state: &ActualState) -> Result<()> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let changed = conn
            .execute(
                "UPDATE displays
                 SET last_power = ?1, last_content_id = ?2, last_reported_at = ?3
                 WHERE id = ?4",
                params![state.power, state.content_id, state.reported_at.timestamp(), display_id],
            )
            .map_err(map_sql_error)?;
        if changed == 0 {
            return Err(SignageError::NotFound(display_id.to_string()));
        }
        debug!(display = %display_id, power = state.power, "stored reported device state");
        Ok(())
    }
}
