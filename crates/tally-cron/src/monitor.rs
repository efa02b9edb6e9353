// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uptime check against an UptimeRobot-compatible `getMonitors` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tally_agent::OpsForwarder;
use tally_config::model::MonitorConfig;
use tally_core::TallyError;
use tally_core::types::{OpsLevel, OpsNote};
use tracing::debug;

use crate::scheduler::Job;

/// Monitor status code meaning "up".
pub const STATUS_UP: i64 = 2;

#[derive(Debug, Deserialize)]
struct MonitorsResponse {
    stat: String,
    #[serde(default)]
    monitors: Vec<MonitorEntry>,
}

#[derive(Debug, Deserialize)]
struct MonitorEntry {
    status: i64,
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Up,
    /// The monitor reported a status other than up.
    Down(i64),
    /// The API answered but did not report `stat: ok` with a monitor.
    ApiError,
}

impl MonitorStatus {
    /// The note mirrored to the ops chat.
    pub fn to_note(self) -> OpsNote {
        match self {
            MonitorStatus::Up => {
                OpsNote::new(OpsLevel::Info, "El bot está funcionando correctamente.")
            }
            MonitorStatus::Down(_) => OpsNote::new(OpsLevel::Warning, "El bot puede estar inactivo."),
            MonitorStatus::ApiError => {
                OpsNote::new(OpsLevel::Error, "Error al verificar el estado del bot.")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UptimeMonitor {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    monitor_id: String,
}

impl UptimeMonitor {
    /// Requires `api_key` and `monitor_id`.
    pub fn new(config: &MonitorConfig) -> Result<Self, TallyError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TallyError::Config("monitor.api_key is required".into()))?;
        let monitor_id = config
            .monitor_id
            .clone()
            .ok_or_else(|| TallyError::Config("monitor.monitor_id is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TallyError::Monitor {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            monitor_id,
        })
    }

    pub async fn check(&self) -> Result<MonitorStatus, TallyError> {
        let url = reqwest::Url::parse_with_params(
            &self.api_url,
            &[
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("monitors", self.monitor_id.as_str()),
            ],
        )
        .map_err(|e| TallyError::Config(format!("invalid monitor.api_url: {e}")))?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| TallyError::Monitor {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "monitor response received");
        if !status.is_success() {
            return Err(TallyError::Monitor {
                message: format!("API returned {status}"),
                source: None,
            });
        }

        let body: MonitorsResponse = response.json().await.map_err(|e| TallyError::Monitor {
            message: format!("invalid response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(classify(&body))
    }
}

fn classify(body: &MonitorsResponse) -> MonitorStatus {
    if body.stat != "ok" {
        return MonitorStatus::ApiError;
    }
    match body.monitors.first() {
        Some(m) if m.status == STATUS_UP => MonitorStatus::Up,
        Some(m) => MonitorStatus::Down(m.status),
        None => MonitorStatus::ApiError,
    }
}

/// Runs the check and mirrors the result to the ops chat.
pub struct MonitorJob {
    monitor: UptimeMonitor,
    ops: OpsForwarder,
}

impl MonitorJob {
    pub fn new(monitor: UptimeMonitor, ops: OpsForwarder) -> Self {
        Self { monitor, ops }
    }
}

#[async_trait]
impl Job for MonitorJob {
    fn name(&self) -> &str {
        "uptime-monitor"
    }

    async fn run(&self) -> Result<(), TallyError> {
        let note = match self.monitor.check().await {
            Ok(status) => status.to_note(),
            Err(e) => OpsNote::new(
                OpsLevel::Error,
                format!("Error al conectar con UptimeRobot: {e}"),
            ),
        };
        self.ops.forward(note).await;
        Ok(())
    }
}
