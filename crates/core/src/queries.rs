//! Read-side queries - status and desired-state composition
//!
//! Composes the schedule engine and occupancy resolver into the single
//! desired state the reconciliation loop pushes, and exposes service
//! status (last import report, per-device sync states) for operators.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use signage_domain::{
    DesiredState, DeviceSyncState, Display, DisplayContent, Occupancy, Result, SyncReport,
};

use crate::occupancy::resolver::OccupancyResolver;
use crate::reconcile::ports::DisplayRepository;
use crate::reconcile::state::DeviceTracker;
use crate::schedule::engine::ScheduleEngine;

/// Last import report, shared between the import worker and status
/// queries.
pub type SharedSyncReport = Arc<RwLock<Option<SyncReport>>>;

/// Compute what a display should show at `at`.
///
/// The schedule decides power for every display. Door signs (displays
/// bound to a location) show that room's occupancy while powered;
/// scheduled content applies to all other displays.
pub async fn desired_state_for(
    display: &Display,
    engine: &ScheduleEngine,
    resolver: &OccupancyResolver,
    at: DateTime<Utc>,
) -> Result<DesiredState> {
    let mut desired = engine.desired_state(&display.id, at).await?;
    if desired.power {
        if let Some(location_id) = &display.location_id {
            let occupancy = resolver.resolve(location_id, at).await?;
            desired.content =
                Some(DisplayContent::Occupancy { location_id: location_id.clone(), occupancy });
        }
    }
    Ok(desired)
}

/// Operator-facing status of one display.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayStatus {
    pub display: Display,
    pub desired: DesiredState,
    pub sync_state: DeviceSyncState,
}

/// Read-side facade over the service's state.
pub struct SignageQueries {
    displays: Arc<dyn DisplayRepository>,
    engine: Arc<ScheduleEngine>,
    resolver: Arc<OccupancyResolver>,
    tracker: Arc<DeviceTracker>,
    last_sync: SharedSyncReport,
}

impl SignageQueries {
    pub fn new(
        displays: Arc<dyn DisplayRepository>,
        engine: Arc<ScheduleEngine>,
        resolver: Arc<OccupancyResolver>,
        tracker: Arc<DeviceTracker>,
        last_sync: SharedSyncReport,
    ) -> Self {
        Self { displays, engine, resolver, tracker, last_sync }
    }

    /// Report of the most recent import cycle, if one has run.
    pub fn last_sync(&self) -> Option<SyncReport> {
        self.last_sync.read().clone()
    }

    /// Per-device reconciliation states.
    pub fn device_states(&self) -> HashMap<String, DeviceSyncState> {
        self.tracker.snapshot()
    }

    /// Current and next event for a location.
    pub async fn occupancy(&self, location_id: &str, at: DateTime<Utc>) -> Result<Occupancy> {
        self.resolver.resolve(location_id, at).await
    }

    /// Full status of one display: registration, computed desired state
    /// and reconciliation state.
    pub async fn display_status(
        &self,
        display_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<DisplayStatus>> {
        let Some(display) = self.displays.get(display_id).await? else {
            return Ok(None);
        };
        let desired = desired_state_for(&display, &self.engine, &self.resolver, at).await?;
        Ok(Some(DisplayStatus {
            sync_state: self.tracker.state_of(&display.id),
            display,
            desired,
        }))
    }
}
