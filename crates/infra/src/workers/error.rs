//! Worker lifecycle errors

use thiserror::Error;

/// Errors from starting or stopping a background worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker already running")]
    AlreadyRunning,

    #[error("worker not running")]
    NotRunning,

    #[error("worker task did not stop within the join timeout")]
    JoinTimeout,

    #[error("worker task panicked: {0}")]
    Panicked(String),
}
