//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the signage service
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SignageError {
    /// The campus event feed could not be reached; previous data stays
    /// authoritative (fail-static).
    #[error("Event source unavailable: {0}")]
    SourceUnavailable(String),

    /// Overlapping events or schedule entries; resolved deterministically,
    /// never fatal.
    #[error("Data conflict: {0}")]
    DataConflict(String),

    #[error("Device unreachable: {0}")]
    DeviceUnreachable(String),

    #[error("Device call timed out: {0}")]
    DeviceTimeout(String),

    #[error("Device rejected command: {0}")]
    DeviceRejected(String),

    /// Malformed schedule window or similar operator input, rejected at
    /// write time.
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignageError {
    /// Returns true for failures that drive the per-device retry state
    /// machine.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnreachable(_) | Self::DeviceTimeout(_) | Self::DeviceRejected(_)
        )
    }
}

/// Result type alias for signage operations
pub type Result<T> = std::result::Result<T, SignageError>;
