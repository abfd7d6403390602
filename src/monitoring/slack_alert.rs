//! Slack alert service for temperature notifications
//!
//! Posts Block Kit messages through `chat.postMessage` using a bot token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use super::classifier::TemperatureStatus;
use super::engine::DEFAULT_CALL_TIMEOUT;
use super::error::DispatchError;
use super::ports::AlertDispatcher;
use super::reading::Reading;
use crate::domain::thermometer::MonitoredDevice;

/// Default Slack Web API base
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// `chat.postMessage` payload
#[derive(Debug, Clone, Serialize)]
pub struct SlackMessage {
    /// Target channel ID
    pub channel: String,
    /// Fallback text for notifications
    pub text: String,
    /// Block Kit layout
    pub blocks: Vec<Value>,
}

/// Subset of the Slack Web API response envelope
#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Slack alert service
#[derive(Debug, Clone)]
pub struct SlackAlert {
    /// Bot token (`xoxb-...`)
    bot_token: String,
    /// Web API base URL
    api_base: String,
    /// HTTP client
    client: Client,
    /// Whether alerts are enabled
    enabled: bool,
}

impl SlackAlert {
    /// Create a new Slack alert service
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: SLACK_API_BASE.to_string(),
            client: http_client(DEFAULT_CALL_TIMEOUT),
            enabled: true,
        }
    }

    /// Create from an optional token; missing token disables alerts
    pub fn from_token(bot_token: Option<String>) -> Self {
        match bot_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => Self::new(token),
            None => Self::disabled(),
        }
    }

    /// Create a disabled alert service (for testing)
    pub fn disabled() -> Self {
        Self {
            bot_token: String::new(),
            api_base: SLACK_API_BASE.to_string(),
            client: http_client(DEFAULT_CALL_TIMEOUT),
            enabled: false,
        }
    }

    /// Bound every `chat.postMessage` call to `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Override the API base (for testing)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Check if alerts are enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.bot_token.is_empty()
    }

    /// Build the alert message for a classified reading
    pub fn build_message(
        device: &MonitoredDevice,
        reading: Option<&Reading>,
        status: &TemperatureStatus,
        at: DateTime<Utc>,
    ) -> SlackMessage {
        let temperature = format_temperature(reading);

        let blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("🌡️ Thermometer monitoring - {}", status.emoji())
                }
            }),
            json!({
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Thermometer ID:*\n`{}`", device.thermometer_id) },
                    { "type": "mrkdwn", "text": format!("*Channel:*\n#{}", device.channel_name) },
                    { "type": "mrkdwn", "text": format!("*Temperature:*\n{}", temperature) },
                    { "type": "mrkdwn", "text": format!("*Status:*\n{}", status.message) }
                ]
            }),
            json!({
                "type": "context",
                "elements": [
                    { "type": "mrkdwn", "text": format!("⏰ {}", at.format("%Y-%m-%d %H:%M:%S UTC")) }
                ]
            }),
        ];

        SlackMessage {
            channel: device.channel_id.clone(),
            text: format!("🌡️ Thermometer alert - {}", temperature),
            blocks,
        }
    }

    /// Send a raw Slack message payload
    async fn send_payload(&self, payload: &SlackMessage) -> Result<(), DispatchError> {
        let url = format!("{}/chat.postMessage", self.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send Slack message");
                DispatchError::Transport(format!("Failed to send Slack message: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Slack API returned error status");
            return Err(DispatchError::Rejected(format!(
                "Slack API error: {} - {}",
                status, body
            )));
        }

        let body: SlackApiResponse = response.json().await.map_err(|e| {
            DispatchError::Rejected(format!("Unreadable Slack API response: {}", e))
        })?;

        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            error!(reason = %reason, "Slack API rejected message");
            return Err(DispatchError::Rejected(reason));
        }

        Ok(())
    }
}

#[async_trait]
impl AlertDispatcher for SlackAlert {
    #[instrument(
        skip(self, device, reading, status),
        fields(thermometer_id = %device.thermometer_id, channel_id = %device.channel_id)
    )]
    async fn dispatch(
        &self,
        device: &MonitoredDevice,
        reading: Option<&Reading>,
        status: &TemperatureStatus,
    ) -> Result<(), DispatchError> {
        if !self.is_enabled() {
            debug!("Slack alerts disabled, skipping");
            return Ok(());
        }

        let payload = Self::build_message(device, reading, status, Utc::now());
        self.send_payload(&payload).await?;

        info!(status = %status.level, "Temperature alert sent");
        Ok(())
    }
}

fn format_temperature(reading: Option<&Reading>) -> String {
    match reading {
        Some(r) => format!("{}°C", r.celsius),
        None => "N/A".to_string(),
    }
}
