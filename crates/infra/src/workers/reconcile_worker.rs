//! Reconciliation worker - drives displays toward their desired state.
//!
//! Every tick the worker computes the desired state of each enabled
//! display, compares it with the last-known device state and pushes
//! commands where they diverge. Commands to one device are serialized
//! through a per-device lock; different devices are reconciled
//! concurrently. A state query at the start of each pass doubles as the
//! heartbeat: devices changed out of band are corrected, and devices
//! already matching are skipped without commands.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use signage_core::{
    backoff_delay, desired_state_for, DeviceDriver, DeviceTracker, DisplayRepository,
    OccupancyResolver, OperatorAlerts, ScheduleEngine,
};
use signage_domain::{
    ActualState, DesiredState, DeviceSyncState, Display, ReconcileConfig, Result, SignageError,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::WorkerError;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything one reconciliation pass needs, shared with the spawned
/// loop task.
struct ReconcileContext {
    displays: Arc<dyn DisplayRepository>,
    engine: Arc<ScheduleEngine>,
    resolver: Arc<OccupancyResolver>,
    driver: Arc<dyn DeviceDriver>,
    tracker: Arc<DeviceTracker>,
    alerts: Arc<dyn OperatorAlerts>,
    locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    config: ReconcileConfig,
}

impl ReconcileContext {
    fn device_lock(&self, display_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry(display_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.config.device_timeout_ms)
    }

    /// Reconcile one display. Holds the device lock for the whole pass so
    /// commands to this device never interleave.
    async fn reconcile_display(&self, disp: Display, cancel: &CancellationToken) {
        let lock = self.device_lock(&disp.id);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let desired = match desired_state_for(&disp, &self.engine, &self.resolver, now).await {
            Ok(desired) => desired,
            Err(e) => {
                error!(display = %disp.id, error = %e, "desired state computation failed");
                return;
            }
        };

        // Heartbeat: prefer what the device reports right now over the
        // stored last-known state.
        let actual = match tokio::time::timeout(
            self.device_timeout(),
            self.driver.query_state(&disp),
        )
        .await
        {
            Ok(Ok(state)) => {
                if let Err(e) = self.displays.update_reported_state(&disp.id, &state).await {
                    warn!(display = %disp.id, error = %e, "failed to store reported state");
                }
                Some(state)
            }
            Ok(Err(e)) => {
                debug!(display = %disp.id, error = %e, "state query failed");
                disp.last_reported.clone()
            }
            Err(_) => {
                debug!(display = %disp.id, "state query timed out");
                disp.last_reported.clone()
            }
        };

        if let Some(actual) = &actual {
            if desired.is_satisfied_by(actual) {
                if self.tracker.mark_in_sync(&disp.id) {
                    self.alerts.device_recovered(&disp).await;
                }
                return;
            }
        }

        self.tracker.mark_pending(&disp.id);
        self.push_with_retries(&disp, &desired, cancel).await;
    }

    /// Push the desired state, retrying with backoff inside this tick
    /// until the attempt cap is hit.
    async fn push_with_retries(
        &self,
        disp: &Display,
        desired: &DesiredState,
        cancel: &CancellationToken,
    ) {
        for _ in 0..self.config.max_attempts {
            if cancel.is_cancelled() {
                return;
            }
            match self.push(disp, desired).await {
                Ok(()) => {
                    let confirmed = ActualState {
                        power: desired.power,
                        content_id: desired.content_id(),
                        reported_at: Utc::now(),
                    };
                    if let Err(e) =
                        self.displays.update_reported_state(&disp.id, &confirmed).await
                    {
                        warn!(display = %disp.id, error = %e, "failed to store confirmed state");
                    }
                    if self.tracker.mark_in_sync(&disp.id) {
                        self.alerts.device_recovered(disp).await;
                    }
                    debug!(display = %disp.id, power = desired.power, "display converged");
                    return;
                }
                Err(e) => {
                    let state = self.tracker.record_failure(
                        &disp.id,
                        &e.to_string(),
                        self.config.max_attempts,
                    );
                    match state {
                        DeviceSyncState::Failed { last_error } => {
                            self.alerts
                                .device_failed(disp, &last_error, self.config.max_attempts)
                                .await;
                            return;
                        }
                        DeviceSyncState::Retrying { attempt } => {
                            let delay = backoff_delay(
                                attempt,
                                self.config.backoff_base_ms,
                                self.config.backoff_cap_ms,
                            );
                            warn!(
                                display = %disp.id,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "command failed; backing off"
                            );
                            tokio::select! {
                                _ = cancel.cancelled() => return,
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        _ => return,
                    }
                }
            }
        }
    }

    /// One command attempt: power first, then content while powered.
    async fn push(&self, display: &Display, desired: &DesiredState) -> Result<()> {
        let timeout = self.device_timeout();
        tokio::time::timeout(timeout, self.driver.set_power(display, desired.power))
            .await
            .map_err(|_| {
                SignageError::DeviceTimeout(format!("{}: power command timed out", display.id))
            })??;

        if desired.power {
            if let Some(content) = &desired.content {
                tokio::time::timeout(timeout, self.driver.set_content(display, content))
                    .await
                    .map_err(|_| {
                        SignageError::DeviceTimeout(format!(
                            "{}: content command timed out",
                            display.id
                        ))
                    })??;
            }
        }
        Ok(())
    }

    /// One full reconciliation pass over all enabled displays.
    async fn tick(self: &Arc<Self>, cancel: &CancellationToken) {
        let displays = match self.displays.list_enabled().await {
            Ok(displays) => displays,
            Err(e) => {
                error!(error = %e, "failed to list displays; skipping tick");
                return;
            }
        };

        let tasks = displays.into_iter().map(|display| {
            let ctx = Arc::clone(self);
            let cancel = cancel.clone();
            async move { ctx.reconcile_display(display, &cancel).await }
        });
        futures::future::join_all(tasks).await;
    }
}

/// Reconciliation worker with explicit lifecycle management.
pub struct ReconcileWorker {
    ctx: Arc<ReconcileContext>,
    tick_interval: Duration,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ReconcileWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        displays: Arc<dyn DisplayRepository>,
        engine: Arc<ScheduleEngine>,
        resolver: Arc<OccupancyResolver>,
        driver: Arc<dyn DeviceDriver>,
        tracker: Arc<DeviceTracker>,
        alerts: Arc<dyn OperatorAlerts>,
        config: ReconcileConfig,
    ) -> Self {
        let tick_interval = Duration::from_secs(config.tick_interval_seconds);
        Self {
            ctx: Arc::new(ReconcileContext {
                displays,
                engine,
                resolver,
                driver,
                tracker,
                alerts,
                locks: DashMap::new(),
                config,
            }),
            tick_interval,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Run a single reconciliation pass immediately.
    ///
    /// Used at startup to converge before the first interval elapses,
    /// and by tests.
    pub async fn reconcile_once(&self) {
        self.ctx.tick(&self.cancellation).await;
    }

    /// Start the worker, spawning the background tick loop.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> std::result::Result<(), WorkerError> {
        if self.is_running() {
            return Err(WorkerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let ctx = Arc::clone(&self.ctx);
        let interval = self.tick_interval;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("reconcile loop cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        ctx.tick(&cancel).await;
                    }
                }
            }
        });

        self.task_handle = Some(handle);
        info!(interval_secs = self.tick_interval.as_secs(), "reconcile worker started");
        Ok(())
    }

    /// Stop the worker and wait for the tick loop to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> std::result::Result<(), WorkerError> {
        if !self.is_running() {
            return Err(WorkerError::NotRunning);
        }

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "reconcile worker task panicked");
                    return Err(WorkerError::Panicked(e.to_string()));
                }
                Err(_) => {
                    warn!("reconcile worker did not stop within timeout");
                    return Err(WorkerError::JoinTimeout);
                }
            }
        }

        info!("reconcile worker stopped");
        Ok(())
    }

    /// Returns true when a worker instance is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }
}

impl Drop for ReconcileWorker {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
