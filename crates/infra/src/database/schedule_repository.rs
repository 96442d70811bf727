//! SQLite-backed implementation of the ScheduleRepository port.

use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use rusqlite::{params, Row};
use signage_core::ScheduleRepository;
use signage_domain::{Result, ScheduleEntry};
use tracing::instrument;

use super::{from_ts, SqlitePool};
use crate::errors::{map_pool_error, map_sql_error};

const ENTRY_COLUMNS: &str = "id, display_id, window_start, window_end, daily_start, daily_stop, \
                             weekdays, power, content_id, priority, created_at";
const TIME_FORMAT: &str = "%H:%M:%S";

/// SQLite implementation of the schedule repository.
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn encode_weekdays(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.num_days_from_monday().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_weekdays(column: usize, raw: &str) -> rusqlite::Result<Vec<Weekday>> {
    raw.split(',')
        .map(|part| {
            part.parse::<u8>()
                .ok()
                .and_then(|n| Weekday::try_from(n).ok())
                .ok_or(rusqlite::Error::InvalidColumnType(
                    column,
                    "weekdays".to_string(),
                    rusqlite::types::Type::Text,
                ))
        })
        .collect()
}

fn decode_time(column: usize, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    let daily_start: Option<String> = row.get(4)?;
    let daily_stop: Option<String> = row.get(5)?;
    let weekdays: Option<String> = row.get(6)?;
    Ok(ScheduleEntry {
        id: row.get(0)?,
        display_id: row.get(1)?,
        window_start: from_ts(2, row.get(2)?)?,
        window_end: from_ts(3, row.get(3)?)?,
        daily_start: daily_start.as_deref().map(|t| decode_time(4, t)).transpose()?,
        daily_stop: daily_stop.as_deref().map(|t| decode_time(5, t)).transpose()?,
        weekdays: weekdays.as_deref().map(|w| decode_weekdays(6, w)).transpose()?,
        power: row.get(7)?,
        content_id: row.get(8)?,
        priority: row.get(9)?,
        created_at: from_ts(10, row.get(10)?)?,
    })
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn entries_for_display(&self, display_id: &str) -> Result<Vec<ScheduleEntry>> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM schedule_entries WHERE display_id = ?1"
            ))
            .map_err(map_sql_error)?;
        let entries = stmt
            .query_map(params![display_id], row_to_entry)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        Ok(entries)
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn upsert(&self, entry: &ScheduleEntry) -> Result<()> {
        // Malformed windows are rejected at write time so resolution never
        // sees them.
        entry.validate()?;

        let conn = self.pool.get().map_err(map_pool_error)?;
        conn.execute(
            "INSERT INTO schedule_entries (id, display_id, window_start, window_end, daily_start,
                                           daily_stop, weekdays, power, content_id, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                 display_id = excluded.display_id,
                 window_start = excluded.window_start,
                 window_end = excluded.window_end,
                 daily_start = excluded.daily_start,
                 daily_stop = excluded.daily_stop,
                 weekdays = excluded.weekdays,
                 power = excluded.power,
                 content_id = excluded.content_id,
                 priority = excluded.priority",
            params![
                entry.id,
                entry.display_id,
                entry.window_start.timestamp(),
                entry.window_end.timestamp(),
                entry.daily_start.map(|t| t.format(TIME_FORMAT).to_string()),
                entry.daily_stop.map(|t| t.format(TIME_FORMAT).to_string()),
                entry.weekdays.as_deref().map(encode_weekdays),
                entry.power,
                entry.content_id,
                entry.priority,
                entry.created_at.timestamp(),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(map_pool_error)?;
        let deleted = conn
            .execute("DELETE FROM schedule_entries WHERE id = ?1", params![id])
            .map_err(map_sql_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_encoding_round_trips() {
        let days = vec![Weekday::Mon, Weekday::Wed, Weekday::Sun];
        let encoded = encode_weekdays(&days);
        assert_eq!(encoded, "0,2,6");
        assert_eq!(decode_weekdays(0, &encoded).unwrap(), days);
    }

    #[test]
    fn corrupt_weekday_value_is_an_error() {
        assert!(decode_weekdays(0, "0,monday").is_err());
        assert!(decode_weekdays(0, "9").is_err());
    }
}
