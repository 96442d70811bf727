//! # Signage Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The import pipeline, occupancy resolver and schedule engine
//! - Port/adapter interfaces (traits)
//! - The per-device reconciliation state machine
//!
//! ## Architecture Principles
//! - Only depends on `signage-domain`
//! - No database, HTTP, or device code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod import;
pub mod occupancy;
pub mod queries;
pub mod reconcile;
pub mod schedule;

// Re-export specific items to avoid ambiguity
pub use import::pipeline::ImportPipeline;
pub use import::ports::{EventSource, EventStore};
pub use occupancy::resolver::OccupancyResolver;
pub use queries::{desired_state_for, SharedSyncReport, SignageQueries};
pub use reconcile::ports::{DeviceDriver, DisplayRepository, OperatorAlerts};
pub use reconcile::state::{backoff_delay, DeviceTracker};
pub use schedule::engine::ScheduleEngine;
pub use schedule::ports::{ContentRepository, ScheduleRepository};
