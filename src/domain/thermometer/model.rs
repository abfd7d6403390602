//! Monitored thermometer record and its alert thresholds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-device temperature thresholds (°C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Lowest acceptable temperature
    pub min_temp: f64,
    /// Highest acceptable temperature
    pub max_temp: f64,
    /// Distance from either bound that is reported as a warning
    pub warning_margin: f64,
}

/// Poll interval plus thresholds, the configurable part of a registration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSettings {
    /// Seconds between two successful checks
    pub monitoring_interval: u32,
    pub thresholds: Thresholds,
}

/// A thermometer registered for monitoring in a delivery channel
///
/// `(thermometer_id, channel_id)` is unique among active records.
/// Records are never hard-deleted; unregistration clears `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredDevice {
    pub thermometer_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub is_active: bool,
    pub monitoring_interval: u32,
    pub thresholds: Thresholds,
    /// Set by the monitoring engine after a successful poll
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonitoredDevice {
    /// Create a new active record
    pub fn new(
        thermometer_id: impl Into<String>,
        channel_id: impl Into<String>,
        channel_name: impl Into<String>,
        settings: DeviceSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            thermometer_id: thermometer_id.into(),
            channel_id: channel_id.into(),
            channel_name: channel_name.into(),
            is_active: true,
            monitoring_interval: settings.monitoring_interval,
            thresholds: settings.thresholds,
            last_checked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current interval and thresholds
    pub fn settings(&self) -> DeviceSettings {
        DeviceSettings {
            monitoring_interval: self.monitoring_interval,
            thresholds: self.thresholds,
        }
    }

    /// Replace interval and thresholds
    pub fn apply_settings(&mut self, settings: DeviceSettings, now: DateTime<Utc>) {
        self.monitoring_interval = settings.monitoring_interval;
        self.thresholds = settings.thresholds;
        self.updated_at = now;
    }

    pub fn matches(&self, thermometer_id: &str, channel_id: &str) -> bool {
        self.thermometer_id == thermometer_id && self.channel_id == channel_id
    }
}
