//! Displays, desired/actual device state and the per-device sync state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::Occupancy;
use super::schedule::ContentItem;

/// A physical sign driven by the reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: String,
    pub name: String,
    /// Device address understood by the driver (e.g. base URL).
    pub address: String,
    /// Set for door signs: the location whose occupancy the sign shows.
    pub location_id: Option<String>,
    pub enabled: bool,
    /// Last state confirmed by the device; mutated only after a confirmed
    /// device response.
    pub last_reported: Option<ActualState>,
}

impl Display {
    /// Door signs show room occupancy instead of scheduled content.
    pub fn is_door_sign(&self) -> bool {
        self.location_id.is_some()
    }
}

/// State a device last reported, either as a command confirmation or an
/// out-of-band heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualState {
    pub power: bool,
    pub content_id: Option<String>,
    pub reported_at: DateTime<Utc>,
}

/// Content a display should show right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayContent {
    /// Operator-scheduled content item.
    Item(ContentItem),
    /// Door sign occupancy view for a location.
    Occupancy { location_id: String, occupancy: Occupancy },
}

impl DisplayContent {
    /// Stable identity used to compare desired against reported content.
    ///
    /// For occupancy views the identity is derived from the shown events,
    /// so a room change produces a new id and triggers a push.
    pub fn content_id(&self) -> String {
        match self {
            Self::Item(item) => item.id.clone(),
            Self::Occupancy { location_id, occupancy } => {
                let current =
                    occupancy.current.as_ref().map(|e| e.external_key.as_str()).unwrap_or("-");
                let next = occupancy.next.as_ref().map(|e| e.external_key.as_str()).unwrap_or("-");
                format!("occupancy:{location_id}:{current}:{next}")
            }
        }
    }
}

/// The power/content a display should show, computed from schedules and
/// occupancy, independent of what the device currently reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub power: bool,
    pub content: Option<DisplayContent>,
}

impl DesiredState {
    /// Fail-safe default: no matching schedule rule means the display is
    /// off, not left showing stale content.
    pub fn off() -> Self {
        Self { power: false, content: None }
    }

    pub fn content_id(&self) -> Option<String> {
        self.content.as_ref().map(DisplayContent::content_id)
    }

    /// True when the reported state already satisfies this desired state.
    pub fn is_satisfied_by(&self, actual: &ActualState) -> bool {
        self.power == actual.power && self.content_id() == actual.content_id
    }
}

/// Per-device reconciliation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeviceSyncState {
    /// Last-known state matches desired state.
    InSync,
    /// Desired differs from actual; a command is due.
    PendingCommand,
    /// A command failed; waiting out the backoff before the next attempt.
    Retrying { attempt: u32 },
    /// Attempt cap exceeded; surfaced to the operator channel and retried
    /// only on the next full tick.
    Failed { last_error: String },
}
