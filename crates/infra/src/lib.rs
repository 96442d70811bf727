//! # Signage Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories (events, schedules, content, displays)
//! - The HTTP campus event source
//! - The HTTP device driver
//! - Background workers (import, reconciliation)
//!
//! ## Architecture
//! - Implements traits defined in `signage-core`
//! - Depends on `signage-domain` and `signage-core`
//! - Contains all "impure" code (I/O, SQL, HTTP)

pub mod config;
pub mod database;
pub mod driver;
pub mod errors;
pub mod source;
pub mod workers;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteContentRepository, SqliteDisplayRepository, SqliteEventStore,
    SqliteScheduleRepository,
};
pub use driver::HttpDeviceDriver;
pub use source::CampusEventSource;
pub use workers::{ImportWorker, LogOperatorAlerts, ReconcileWorker};
