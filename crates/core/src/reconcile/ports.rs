//! Port interfaces for the reconciliation loop

use async_trait::async_trait;
use signage_domain::{ActualState, Display, DisplayContent, Result};

/// Transport to a physical display device.
///
/// Commands must be idempotent: re-sending the current power state or the
/// currently shown content is a no-op on the device, so the loop never
/// needs to know whether an earlier timed-out command actually applied.
///
/// Implementations map transport failures to the device error variants
/// (`DeviceUnreachable`, `DeviceTimeout`, `DeviceRejected`).
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Set the device power state.
    async fn set_power(&self, display: &Display, on: bool) -> Result<()>;

    /// Put content on the device.
    async fn set_content(&self, display: &Display, content: &DisplayContent) -> Result<()>;

    /// Query the state the device currently reports.
    async fn query_state(&self, display: &Display) -> Result<ActualState>;
}

/// Repository of registered displays.
#[async_trait]
pub trait DisplayRepository: Send + Sync {
    /// All displays the reconciliation loop should drive.
    async fn list_enabled(&self) -> Result<Vec<Display>>;

    /// Look up one display by id.
    async fn get(&self, id: &str) -> Result<Option<Display>>;

    /// Insert or replace a display.
    async fn upsert(&self, display: &Display) -> Result<()>;

    /// Persist the state a device confirmed or reported out of band.
    async fn update_reported_state(&self, display_id: &str, state: &ActualState) -> Result<()>;
}

/// Sink for operator-facing alerts.
///
/// Implementations must not fail the reconciliation loop; delivery
/// problems are their own concern.
#[async_trait]
pub trait OperatorAlerts: Send + Sync {
    /// A device exhausted its retry budget.
    async fn device_failed(&self, display: &Display, last_error: &str, attempts: u32);

    /// A previously failed device converged again.
    async fn device_recovered(&self, display: &Display);
}
