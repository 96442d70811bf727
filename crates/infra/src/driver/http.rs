//! HTTP device driver for network-attached displays.
//!
//! Speaks a small REST protocol against each display's address:
//! `PUT /api/power`, `PUT /api/content` and `GET /api/state`. Power and
//! content commands are idempotent on the device side, so re-sending
//! after a timeout is always safe.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use signage_core::DeviceDriver;
use signage_domain::{ActualState, Display, DisplayContent, Result, SignageError};
use tracing::{debug, instrument};

use crate::errors::classify_device_error;

#[derive(Debug, Serialize)]
struct PowerCommand {
    on: bool,
}

#[derive(Debug, Serialize)]
struct ContentCommand<'a> {
    content_id: String,
    content: &'a DisplayContent,
}

#[derive(Debug, Deserialize)]
struct StateDto {
    power: bool,
    #[serde(default)]
    content_id: Option<String>,
}

/// HTTP implementation of the device driver.
pub struct HttpDeviceDriver {
    client: reqwest::Client,
}

impl HttpDeviceDriver {
    /// Build a driver whose individual calls are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignageError::Internal(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    fn endpoint(display: &Display, path: &str) -> String {
        format!("{}/api/{path}", display.address.trim_end_matches('/'))
    }

    fn check_status(display: &Display, path: &str, status: reqwest::StatusCode) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(SignageError::DeviceRejected(format!(
                "{} {path} returned {status}",
                display.id
            )))
        }
    }
}

#[async_trait]
impl DeviceDriver for HttpDeviceDriver {
    #[instrument(skip(self, disp), fields(display = %disp.id))]
    async fn set_power(&self, disp: &Display, on: bool) -> Result<()> {
        let response = self
            .client
            .put(Self::endpoint(disp, "power"))
            .json(&PowerCommand { on })
            .send()
            .await
            .map_err(|e| classify_device_error(&e))?;
        Self::check_status(disp, "power", response.status())?;
        debug!(on, "power command accepted");
        Ok(())
    }

    #[instrument(skip(self, disp, content), fields(display = %disp.id))]
    async fn set_content(&self, disp: &Display, content: &DisplayContent) -> Result<()> {
        let command = ContentCommand { content_id: content.content_id(), content };
        let response = self
            .client
            .put(Self::endpoint(disp, "content"))
            .json(&command)
            .send()
            .await
            .map_err(|e| classify_device_error(&e))?;
        Self::check_status(disp, "content", response.status())?;
        debug!(content_id = %command.content_id, "content command accepted");
        Ok(())
    }

    #[instrument(skip(self, disp), fields(display = %disp.id))]
    async fn query_state(&self, disp: &Display) -> Result<ActualState> {
        let response = self
            .client
            .get(Self::endpoint(disp, "state"))
            .send()
            .await
            .map_err(|e| classify_device_error(&e))?;
        Self::check_status(disp, "state", response.status())?;
        let dto: StateDto =
            response.json().await.map_err(|e| classify_device_error(&e))?;
        Ok(ActualState { power: dto.power, content_id: dto.content_id, reported_at: Utc::now() })
    }
}
