//! Shared fixtures for infra integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use signage_core::{
    ContentRepository, DeviceDriver, DisplayRepository, EventStore, OperatorAlerts,
    ScheduleRepository,
};
use signage_domain::{
    ActualState, ContentItem, Display, DisplayContent, Event, Result, ScheduleEntry, SignageError,
    SourceEvent,
};

pub fn ts(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
}

pub fn event(key: &str, room: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
    Event::from_source(
        &SourceEvent {
            external_key: key.into(),
            location_id: room.into(),
            start,
            end,
            title: format!("Lecture {key}"),
            lecturers: vec!["Dr. Gruber".into()],
        },
        start,
    )
}

pub fn display(id: &str, location: Option<&str>) -> Display {
    Display {
        id: id.into(),
        name: format!("Display {id}"),
        address: format!("http://{id}.signs.local"),
        location_id: location.map(str::to_string),
        enabled: true,
        last_reported: None,
    }
}

pub fn always_on(display_id: &str) -> ScheduleEntry {
    ScheduleEntry {
        id: format!("{display_id}-on"),
        display_id: display_id.into(),
        // The reconcile worker evaluates schedules at `Utc::now()`, so
        // this window must cover the wall clock, not just the fixture's
        // March 2026 timestamps.
        window_start: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
        window_end: Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
        daily_start: None,
        daily_stop: None,
        weekdays: None,
        power: true,
        content_id: None,
        priority: 0,
        created_at: ts(1, 0, 0),
    }
}

/// In-memory implementation of all storage ports.
#[derive(Default)]
pub struct MemoryWorld {
    pub events: Mutex<Vec<Event>>,
    pub entries: Mutex<Vec<ScheduleEntry>>,
    pub contents: Mutex<Vec<ContentItem>>,
    pub displays: Mutex<Vec<Display>>,
}

impl MemoryWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl EventStore for MemoryWorld {
    async fn get_by_external_key(&self, key: &str) -> Result<Option<Event>> {
        Ok(self.events.lock().iter().find(|e| e.external_key == key).cloned())
    }

    async fn insert(&self, event: &Event) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<()> {
        let mut events = self.events.lock();
        let slot = events
            .iter_mut()
            .find(|e| e.external_key == event.external_key)
            .ok_or_else(|| SignageError::NotFound(event.external_key.clone()))?;
        *slot = event.clone();
        Ok(())
    }

    async fn touch_last_seen(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        let mut events = self.events.lock();
        let slot = events
            .iter_mut()
            .find(|e| e.external_key == key)
            .ok_or_else(|| SignageError::NotFound(key.to_string()))?;
        slot.last_seen = at;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut events = self.events.lock();
        let before = events.len();
        events.retain(|e| e.external_key != key);
        Ok(events.len() < before)
    }

    async fn find_spanning(&self, location_id: &str, at: DateTime<Utc>) -> Result<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.location_id == location_id && e.contains(at))
            .cloned()
            .collect())
    }

    async fn find_next_after(
        &self,
        location_id: &str,
        after: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.location_id == location_id && e.start > after)
            .min_by_key(|e| e.start)
            .cloned())
    }

    async fn find_overlapping(
        &self,
        location_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.location_id == location_id && e.start < end && start < e.end)
            .cloned()
            .collect())
    }

    async fn evict_stale(
        &self,
        last_seen_before: DateTime<Utc>,
        end_after: DateTime<Utc>,
    ) -> Result<usize> {
        let mut events = self.events.lock();
        let before = events.len();
        events.retain(|e| !(e.last_seen < last_seen_before && e.end > end_after));
        Ok(before - events.len())
    }

    async fn delete_ended_before(&self, before: DateTime<Utc>) -> Result<usize> {
        let mut events = self.events.lock();
        let len = events.len();
        events.retain(|e| e.end >= before);
        Ok(len - events.len())
    }
}

#[async_trait]
impl ScheduleRepository for MemoryWorld {
    async fn entries_for_display(&self, display_id: &str) -> Result<Vec<ScheduleEntry>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|e| e.display_id == display_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, entry: &ScheduleEntry) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.id != entry.id);
        entries.push(entry.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() < before)
    }
}

#[async_trait]
impl ContentRepository for MemoryWorld {
    async fn get(&self, id: &str) -> Result<Option<ContentItem>> {
        Ok(self.contents.lock().iter().find(|c| c.id == id).cloned())
    }

    async fn upsert(&self, item: &ContentItem) -> Result<()> {
        let mut contents = self.contents.lock();
        contents.retain(|c| c.id != item.id);
        contents.push(item.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut contents = self.contents.lock();
        let before = contents.len();
        contents.retain(|c| c.id != id);
        Ok(contents.len() < before)
    }
}

#[async_trait]
impl DisplayRepository for MemoryWorld {
    async fn list_enabled(&self) -> Result<Vec<Display>> {
        Ok(self.displays.lock().iter().filter(|d| d.enabled).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Display>> {
        Ok(self.displays.lock().iter().find(|d| d.id == id).cloned())
    }

    async fn upsert(&self, display: &Display) -> Result<()> {
        let mut displays = self.displays.lock();
        displays.retain(|d| d.id != display.id);
        displays.push(display.clone());
        Ok(())
    }

    async fn update_reported_state(&self, display_id: &str, state: &ActualState) -> Result<()> {
        let mut displays = self.displays.lock();
        let slot = displays
            .iter_mut()
            .find(|d| d.id == display_id)
            .ok_or_else(|| SignageError::NotFound(display_id.to_string()))?;
        slot.last_reported = Some(state.clone());
        Ok(())
    }
}

/// Scripted device driver: an optional reported state and a budget of
/// command failures, with every accepted command recorded.
#[derive(Default)]
pub struct ScriptedDriver {
    /// What `query_state` returns; `None` means the device is unreachable.
    pub reported: Mutex<Option<ActualState>>,
    /// Commands to fail (with `DeviceTimeout`) before succeeding.
    pub failures_remaining: Mutex<u32>,
    pub power_commands: Mutex<Vec<(String, bool)>>,
    pub content_commands: Mutex<Vec<(String, String)>>,
}

impl ScriptedDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reporting(state: ActualState) -> Arc<Self> {
        let driver = Self::default();
        *driver.reported.lock() = Some(state);
        Arc::new(driver)
    }

    pub fn failing(times: u32) -> Arc<Self> {
        let driver = Self::default();
        *driver.failures_remaining.lock() = times;
        Arc::new(driver)
    }

    fn try_consume_failure(&self, display: &Display) -> Result<()> {
        let mut remaining = self.failures_remaining.lock();
        if *remaining > 0 {
            *remaining -= 1;
            Err(SignageError::DeviceTimeout(format!("{}: scripted timeout", display.id)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeviceDriver for ScriptedDriver {
    async fn set_power(&self, display: &Display, on: bool) -> Result<()> {
        self.try_consume_failure(display)?;
        self.power_commands.lock().push((display.id.clone(), on));
        let mut reported = self.reported.lock();
        let state = reported.get_or_insert_with(|| ActualState {
            power: false,
            content_id: None,
            reported_at: Utc::now(),
        });
        state.power = on;
        Ok(())
    }

    async fn set_content(&self, display: &Display, content: &DisplayContent) -> Result<()> {
        self.try_consume_failure(display)?;
        let id = content.content_id();
        self.content_commands.lock().push((display.id.clone(), id.clone()));
        if let Some(state) = self.reported.lock().as_mut() {
            state.content_id = Some(id);
        }
        Ok(())
    }

    async fn query_state(&self, display: &Display) -> Result<ActualState> {
        self.reported
            .lock()
            .clone()
            .ok_or_else(|| SignageError::DeviceUnreachable(format!("{}: no device", display.id)))
    }
}

/// Records operator alerts for assertions.
#[derive(Default)]
pub struct RecordingAlerts {
    pub failed: Mutex<Vec<(String, String, u32)>>,
    pub recovered: Mutex<Vec<String>>,
}

impl RecordingAlerts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl OperatorAlerts for RecordingAlerts {
    async fn device_failed(&self, display: &Display, last_error: &str, attempts: u32) {
        self.failed.lock().push((display.id.clone(), last_error.to_string(), attempts));
    }

    async fn device_recovered(&self, display: &Display) {
        self.recovered.lock().push(display.id.clone());
    }
}
