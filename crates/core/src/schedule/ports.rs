//! Port interfaces for schedule and content storage

use async_trait::async_trait;
use signage_domain::{ContentItem, Result, ScheduleEntry};

/// Repository of operator-defined schedule entries.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// All schedule entries targeting the given display.
    async fn entries_for_display(&self, display_id: &str) -> Result<Vec<ScheduleEntry>>;

    /// Insert or replace a schedule entry.
    async fn upsert(&self, entry: &ScheduleEntry) -> Result<()>;

    /// Delete an entry. Returns true when a row was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Repository of referenced content items.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Look up a content item by id.
    async fn get(&self, id: &str) -> Result<Option<ContentItem>>;

    /// Insert or replace a content item.
    async fn upsert(&self, item: &ContentItem) -> Result<()>;

    /// Delete a content item. Returns true when a row was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}
