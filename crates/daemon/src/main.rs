//! signaged - campus signage synchronization daemon
//!
//! Wires the SQLite repositories, the campus feed client and the HTTP
//! device driver into the import and reconciliation workers, then runs
//! until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use parking_lot::RwLock;
use signage_core::{
    DeviceTracker, ImportPipeline, OccupancyResolver, ScheduleEngine, SharedSyncReport,
};
use signage_infra::workers::{ImportWorker, LogOperatorAlerts, ReconcileWorker};
use signage_infra::{
    CampusEventSource, DbManager, HttpDeviceDriver, SqliteContentRepository,
    SqliteDisplayRepository, SqliteEventStore, SqliteScheduleRepository,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = signage_infra::config::load().context("loading configuration")?;

    let manager = DbManager::new(&config.database.path, config.database.pool_size)
        .context("opening database")?;
    manager.run_migrations().context("running migrations")?;
    let pool = manager.pool();

    let event_store = Arc::new(SqliteEventStore::new(pool.clone()));
    let schedules = Arc::new(SqliteScheduleRepository::new(pool.clone()));
    let contents = Arc::new(SqliteContentRepository::new(pool.clone()));
    let displays = Arc::new(SqliteDisplayRepository::new(pool));

    let source = Arc::new(CampusEventSource::new(&config.source).context("building feed client")?);
    let pipeline =
        Arc::new(ImportPipeline::new(source, event_store.clone(), config.import.clone()));

    let engine = Arc::new(ScheduleEngine::new(schedules, contents));
    let resolver = Arc::new(OccupancyResolver::new(event_store));
    let tracker = Arc::new(DeviceTracker::new());
    let driver = Arc::new(
        HttpDeviceDriver::new(Duration::from_millis(config.reconcile.device_timeout_ms))
            .context("building device driver")?,
    );

    let last_report: SharedSyncReport = Arc::new(RwLock::new(None));

    let mut import_worker =
        ImportWorker::new(pipeline.clone(), last_report.clone(), config.import.clone());
    let mut reconcile_worker = ReconcileWorker::new(
        displays,
        engine,
        resolver,
        driver,
        tracker,
        Arc::new(LogOperatorAlerts),
        config.reconcile.clone(),
    );

    // Converge once before the first interval elapses.
    if config.import.enabled {
        match pipeline.sync(Utc::now()).await {
            Ok(report) => *last_report.write() = Some(report),
            Err(e) => error!(error = %e, "initial import failed"),
        }
    }
    reconcile_worker.reconcile_once().await;

    import_worker.start().context("starting import worker")?;
    reconcile_worker.start().context("starting reconcile worker")?;

    info!("signaged running");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown signal received");

    if import_worker.is_running() {
        import_worker.stop().await.context("stopping import worker")?;
    }
    reconcile_worker.stop().await.context("stopping reconcile worker")?;

    Ok(())
}
