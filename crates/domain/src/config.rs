//! Configuration structures
//!
//! Recognized options mirror the service knobs: import window offsets,
//! staleness eviction threshold, reconciliation tick interval, retry
//! backoff parameters and the device call timeout.

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// SQLite database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "signage.db".to_string(), pool_size: 4 }
    }
}

/// Campus event feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8080".to_string(), token: None, timeout_seconds: 30 }
    }
}

/// Import pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub enabled: bool,
    /// Seconds between import cycles.
    pub interval_seconds: u64,
    /// How far into the past the fetch window reaches.
    pub window_past_hours: i64,
    /// How far into the future the fetch window reaches.
    pub window_future_days: i64,
    /// Events not re-confirmed for this long are evicted (if their window
    /// has not ended yet). Must cover several failed cycles so a transient
    /// source outage never wipes future events.
    pub staleness_threshold_hours: i64,
    /// Events that ended this long ago are cleaned up.
    pub retention_days: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 900,
            window_past_hours: 1,
            window_future_days: 7,
            staleness_threshold_hours: 6,
            retention_days: 30,
        }
    }
}

/// Reconciliation loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Seconds between reconciliation ticks.
    pub tick_interval_seconds: u64,
    /// Base delay for exponential retry backoff.
    pub backoff_base_ms: u64,
    /// Upper bound on a single backoff delay.
    pub backoff_cap_ms: u64,
    /// Attempts per tick before a device transitions to `Failed`.
    pub max_attempts: u32,
    /// Bound on a single driver call.
    pub device_timeout_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 30,
            backoff_base_ms: 500,
            backoff_cap_ms: 8_000,
            max_attempts: 3,
            device_timeout_ms: 5_000,
        }
    }
}
