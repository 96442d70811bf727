//! Per-device sync state tracking and retry backoff
//!
//! The tracker is the loop's memory between ticks: which devices are in
//! sync, which have a command due and which exhausted their retry
//! budget. State only advances through confirmed observations; a
//! timed-out command never updates the last-known device state.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use signage_domain::DeviceSyncState;
use tracing::debug;

/// Exponential backoff with jitter for device command retries.
///
/// `attempt` is 1-based. The delay doubles per attempt, is capped at
/// `cap_ms` and gets up to 25% random jitter so a rack of devices that
/// failed together does not retry in lockstep.
pub fn backoff_delay(attempt: u32, base_ms: u64, cap_ms: u64) -> Duration {
    let exp = base_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(16));
    let capped = exp.min(cap_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 4);
    Duration::from_millis(capped.saturating_add(jitter))
}

/// In-memory tracker of per-device reconciliation state.
///
/// Devices without an entry are treated as `InSync`; the map only grows
/// as devices diverge.
#[derive(Default)]
pub struct DeviceTracker {
    states: RwLock<HashMap<String, DeviceSyncState>>,
}

impl DeviceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a device.
    pub fn state_of(&self, display_id: &str) -> DeviceSyncState {
        self.states.read().get(display_id).cloned().unwrap_or(DeviceSyncState::InSync)
    }

    /// The device was observed (or confirmed) to match its desired state.
    ///
    /// Returns true when the device was previously `Failed`, so the
    /// caller can emit a recovery alert.
    pub fn mark_in_sync(&self, display_id: &str) -> bool {
        let previous = self.states.write().insert(display_id.to_string(), DeviceSyncState::InSync);
        matches!(previous, Some(DeviceSyncState::Failed { .. }))
    }

    /// Desired and reported state diverge; a command is due.
    pub fn mark_pending(&self, display_id: &str) {
        self.states.write().insert(display_id.to_string(), DeviceSyncState::PendingCommand);
    }

    /// A command attempt failed.
    ///
    /// Counts the attempt against the device's retry budget and returns
    /// the resulting state: `Retrying` while attempts remain, `Failed`
    /// once `max_attempts` is reached.
    pub fn record_failure(
        &self,
        display_id: &str,
        error: &str,
        max_attempts: u32,
    ) -> DeviceSyncState {
        let mut states = self.states.write();
        let attempt = match states.get(display_id) {
            Some(DeviceSyncState::Retrying { attempt }) => attempt + 1,
            _ => 1,
        };
        let next = if attempt >= max_attempts {
            DeviceSyncState::Failed { last_error: error.to_string() }
        } else {
            DeviceSyncState::Retrying { attempt }
        };
        debug!(display = %display_id, attempt, state = ?next, "device command failed");
        states.insert(display_id.to_string(), next.clone());
        next
    }

    /// Drop tracking for a device (e.g. unregistered display).
    pub fn forget(&self, display_id: &str) {
        self.states.write().remove(display_id);
    }

    /// Snapshot of all tracked device states.
    pub fn snapshot(&self) -> HashMap<String, DeviceSyncState> {
        self.states.read().clone()
    }
}
