//! Schedule entries and display content

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SignageError};

/// Operator-managed content shown on a public display.
///
/// The payload is opaque to the core; only identity and validity bounds
/// matter for resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub name: String,
    /// Opaque payload reference (URL, rendered page descriptor, ...).
    pub payload: serde_json::Value,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// True when the item may be shown at `at` according to its validity
    /// bounds.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.valid_from {
            if at < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if at >= until {
                return false;
            }
        }
        true
    }
}

/// A time-windowed rule determining power state and content for a display.
///
/// Entries for one display may overlap; resolution always picks exactly one
/// winner (priority, then narrowest concrete window, then latest created).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub display_id: String,
    /// Absolute bounds within which the entry can ever be active.
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Optional time-of-day recurrence window. When set, the entry is only
    /// active between these times on recurring days.
    pub daily_start: Option<NaiveTime>,
    pub daily_stop: Option<NaiveTime>,
    /// Days of week the entry recurs on. `None` means every day.
    pub weekdays: Option<Vec<Weekday>>,
    pub power: bool,
    pub content_id: Option<String>,
    /// Higher wins.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Validate operator input at write time so malformed windows never
    /// reach resolution logic.
    pub fn validate(&self) -> Result<()> {
        if self.window_start >= self.window_end {
            return Err(SignageError::ConfigurationInvalid(format!(
                "schedule entry {}: window start {} is not before end {}",
                self.id, self.window_start, self.window_end
            )));
        }
        match (self.daily_start, self.daily_stop) {
            (Some(start), Some(stop)) if start >= stop => {
                Err(SignageError::ConfigurationInvalid(format!(
                    "schedule entry {}: daily start {} is not before stop {}",
                    self.id, start, stop
                )))
            }
            (Some(_), None) | (None, Some(_)) => Err(SignageError::ConfigurationInvalid(format!(
                "schedule entry {}: daily start and stop must be set together",
                self.id
            ))),
            _ => Ok(()),
        }
    }

    /// True when the entry recurs on the given weekday.
    pub fn recurs_on(&self, weekday: Weekday) -> bool {
        match &self.weekdays {
            Some(days) => days.contains(&weekday),
            None => true,
        }
    }
}
