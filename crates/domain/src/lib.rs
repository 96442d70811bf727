//! # Signage Domain
//!
//! Business domain types for the campus signage service.
//!
//! This crate contains:
//! - Domain data types (Event, ScheduleEntry, Display, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other signage crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
