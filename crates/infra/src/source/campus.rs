//! HTTP client for the campus events feed.
//!
//! The feed is read-only: one GET returns every event record valid in
//! the requested window. All transport and decoding failures map to
//! `SignageError::SourceUnavailable` so the import pipeline treats them
//! uniformly as "skip this cycle".

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use signage_core::EventSource;
use signage_domain::{Result, SignageError, SourceConfig, SourceEvent, TimeWindow};
use tracing::{debug, instrument};

use crate::errors::map_source_error;

/// One event record as served by the campus system.
#[derive(Debug, Deserialize)]
struct EventRecordDto {
    id: String,
    room: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    title: String,
    #[serde(default)]
    lecturers: Vec<String>,
}

impl From<EventRecordDto> for SourceEvent {
    fn from(dto: EventRecordDto) -> Self {
        Self {
            external_key: dto.id,
            location_id: dto.room,
            start: dto.start,
            end: dto.end,
            title: dto.title,
            lecturers: dto.lecturers,
        }
    }
}

/// HTTP implementation of the campus event source.
pub struct CampusEventSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CampusEventSource {
    /// Build a client from the feed configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(map_source_error)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl EventSource for CampusEventSource {
    #[instrument(skip(self))]
    async fn fetch_events(&self, window: TimeWindow) -> Result<Vec<SourceEvent>> {
        let url = format!("{}/api/events", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("from", window.start.to_rfc3339()),
            ("until", window.end.to_rfc3339()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_source_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SignageError::SourceUnavailable(format!(
                "campus feed returned {status}"
            )));
        }

        let records: Vec<EventRecordDto> = response.json().await.map_err(map_source_error)?;
        debug!(count = records.len(), "fetched campus event records");
        Ok(records.into_iter().map(SourceEvent::from).collect())
    }
}
