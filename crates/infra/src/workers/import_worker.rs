//! Import worker for periodic campus feed synchronization.
//!
//! Runs the import pipeline on a fixed interval and publishes the
//! resulting report for status queries. A failed cycle is logged and the
//! previous data stays authoritative; the worker never stops on its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use signage_core::{ImportPipeline, SharedSyncReport};
use signage_domain::ImportConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::WorkerError;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Import worker with explicit lifecycle management.
pub struct ImportWorker {
    pipeline: Arc<ImportPipeline>,
    last_report: SharedSyncReport,
    config: ImportConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ImportWorker {
    pub fn new(
        pipeline: Arc<ImportPipeline>,
        last_report: SharedSyncReport,
        config: ImportConfig,
    ) -> Self {
        Self {
            pipeline,
            last_report,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background sync task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.is_running() {
            return Err(WorkerError::AlreadyRunning);
        }
        if !self.config.enabled {
            info!("import disabled by configuration; worker not started");
            return Ok(());
        }

        self.cancellation = CancellationToken::new();

        let pipeline = Arc::clone(&self.pipeline);
        let last_report = Arc::clone(&self.last_report);
        let interval = Duration::from_secs(self.config.interval_seconds);
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::sync_loop(pipeline, last_report, interval, cancel).await;
        });

        self.task_handle = Some(handle);
        info!(interval_secs = self.config.interval_seconds, "import worker started");
        Ok(())
    }

    /// Stop the worker and wait for the sync task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), WorkerError> {
        if !self.is_running() {
            return Err(WorkerError::NotRunning);
        }

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "import worker task panicked");
                    return Err(WorkerError::Panicked(e.to_string()));
                }
                Err(_) => {
                    warn!("import worker did not stop within timeout");
                    return Err(WorkerError::JoinTimeout);
                }
            }
        }

        info!("import worker stopped");
        Ok(())
    }

    /// Returns true when a worker instance is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn sync_loop(
        pipeline: Arc<ImportPipeline>,
        last_report: SharedSyncReport,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("import loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    match pipeline.sync(Utc::now()).await {
                        Ok(report) => {
                            if !report.success {
                                warn!(error = ?report.error, "import cycle skipped; source unavailable");
                            }
                            *last_report.write() = Some(report);
                        }
                        Err(e) => {
                            // Storage failure; retried on the next tick.
                            error!(error = %e, "import cycle failed");
                        }
                    }
                }
            }
        }
    }
}

impl Drop for ImportWorker {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
