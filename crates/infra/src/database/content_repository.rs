//! SQLite-backed implementation of the ContentRepository port.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use signage_core::ContentRepository;
use signage_domain::{ContentItem, Result, SignageError};

use super::{from_ts, SqlitePool};
use crate::errors::{map_pool_error, map_sql_error};

/// SQLite implementation of the content repository.
pub struct SqliteContentRepository {
    pool: SqlitePool,
}

impl SqliteContentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ContentItem> {
    let payload_json: String = row.get(2)?;
    let payload = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let valid_from: Option<i64> = row.get(3)?;
    let valid_until: Option<i64> = row.get(4)?;
    Ok(ContentItem {
        id: row.get(0)?,
        name: row.get(1)?,
        payload,
        valid_from: valid_from.map(|ts| from_ts(3, ts)).transpose()?,
        valid_until: valid_until.map(|ts| from_ts(4, ts)).transpose()?,
    })
}

#[async_trait]
impl ContentRepository for SqliteContentRepository {
    async fn get(&self, id: &str) -> Result<Option<ContentItem>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.query_row(
            "SELECT id, name, payload, valid_from, valid_until FROM content_items WHERE id = ?1",
            params![id],
            row_to_item,
        )
        .optional()
        .map_err(map_sql_error)
    }

    async fn upsert(&self, item: &ContentItem) -> Result<()> {
        let payload = serde_json::to_string(&item.payload)
            .map_err(|e| SignageError::Database(format!("payload serialization: {e}")))?;
        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.execute(
            "INSERT INTO content_items (id, name, payload, valid_from, valid_until)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 payload = excluded.payload,
                 valid_from = excluded.valid_from,
                 valid_until = excluded.valid_until",
            params![
                item.id,
                item.name,
                payload,
                item.valid_from.map(|t| t.timestamp()),
                item.valid_until.map(|t| t.timestamp()),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let deleted = conn
            .execute("DELETE FROM content_items WHERE id = ?1", params![id])
            .map_err(map_sql_error)?;
        Ok(deleted > 0)
    }
}
