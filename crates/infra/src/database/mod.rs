//! SQLite-backed implementations of the core storage ports

mod content_repository;
mod display_repository;
mod event_repository;
mod manager;
mod schedule_repository;

pub use content_repository::SqliteContentRepository;
pub use display_repository::SqliteDisplayRepository;
pub use event_repository::SqliteEventStore;
pub use manager::DbManager;
pub use schedule_repository::SqliteScheduleRepository;

use chrono::{DateTime, Utc};
use r2d2_sqlite::SqliteConnectionManager;

/// Shared connection pool type.
pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// Convert a stored unix timestamp back into a `DateTime<Utc>`.
///
/// Usable inside rusqlite row-mapping closures; out-of-range values
/// surface as a conversion error instead of panicking.
pub(crate) fn from_ts(column: usize, ts: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, ts))
}
