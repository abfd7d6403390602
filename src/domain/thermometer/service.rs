use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ConfigurationError, ThermometerError};
use super::model::MonitoredDevice;
use super::policy::{ThresholdPolicy, ThresholdSettings};
use super::store::ThermometerStore;
use crate::monitoring::{Clock, LifecycleController, MonitoringStatus};

/// Registration command
#[derive(Debug, Clone, Default)]
pub struct RegisterThermometer {
    pub thermometer_id: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub settings: ThresholdSettings,
}

/// Registration rules on top of the store, driving the monitoring lifecycle
pub struct ThermometerService {
    store: Arc<dyn ThermometerStore>,
    lifecycle: Arc<LifecycleController>,
    policy: ThresholdPolicy,
    clock: Arc<dyn Clock>,
}

impl ThermometerService {
    pub fn new(
        store: Arc<dyn ThermometerStore>,
        lifecycle: Arc<LifecycleController>,
        policy: ThresholdPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            policy,
            clock,
        }
    }

    /// Register a thermometer in a channel and make sure monitoring runs
    ///
    /// - active pair: `AlreadyActive`
    /// - inactive pair: reactivated, supplied settings overwrite stored ones
    /// - otherwise a new record with policy defaults for missing settings
    pub async fn register(
        &self,
        command: RegisterThermometer,
    ) -> Result<MonitoredDevice, ThermometerError> {
        let thermometer_id = required("thermometerId", &command.thermometer_id)?;
        let channel_id = required("channelId", &command.channel_id)?;
        let now = self.clock.now();

        info!(thermometer_id, channel_id, "Registering thermometer");

        let device = match self.store.find(thermometer_id, channel_id).await? {
            Some(existing) if existing.is_active => {
                return Err(ThermometerError::AlreadyActive {
                    thermometer_id: thermometer_id.to_string(),
                    channel_id: channel_id.to_string(),
                });
            }
            Some(mut existing) => {
                let settings = self
                    .policy
                    .resolve_over(existing.settings(), &command.settings)?;
                existing.apply_settings(settings, now);
                existing.is_active = true;
                if let Some(name) = channel_name(&command) {
                    existing.channel_name = name;
                }
                let device = self.store.update(existing).await?;
                info!(thermometer_id, channel_id, "Inactive thermometer reactivated");
                device
            }
            None => {
                let settings = self.policy.resolve(&command.settings)?;
                let name = channel_name(&command).unwrap_or_else(|| fallback_channel_name(channel_id));
                let device = self
                    .store
                    .insert(MonitoredDevice::new(
                        thermometer_id,
                        channel_id,
                        name,
                        settings,
                        now,
                    ))
                    .await?;
                info!(thermometer_id, channel_id, "Thermometer registered");
                device
            }
        };

        self.lifecycle.on_device_registered();
        Ok(device)
    }

    /// Deactivate a registration and stop monitoring when none remain
    pub async fn unregister(
        &self,
        thermometer_id: &str,
        channel_id: &str,
    ) -> Result<MonitoredDevice, ThermometerError> {
        let thermometer_id = required("thermometerId", thermometer_id)?;
        let channel_id = required("channelId", channel_id)?;

        info!(thermometer_id, channel_id, "Unregistering thermometer");

        let mut device = self
            .store
            .find(thermometer_id, channel_id)
            .await?
            .ok_or_else(|| ThermometerError::NotRegistered {
                thermometer_id: thermometer_id.to_string(),
                channel_id: channel_id.to_string(),
            })?;

        if !device.is_active {
            return Err(ThermometerError::AlreadyInactive {
                thermometer_id: thermometer_id.to_string(),
                channel_id: channel_id.to_string(),
            });
        }

        device.is_active = false;
        device.updated_at = self.clock.now();
        let device = self.store.update(device).await?;

        if let Err(e) = self.lifecycle.on_device_unregistered().await {
            warn!(error = %e, "Could not count active thermometers after unregistration");
        }

        info!(thermometer_id, channel_id, "Thermometer unregistered");
        Ok(device)
    }

    /// Active thermometers of a channel, newest first
    pub async fn list_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<MonitoredDevice>, ThermometerError> {
        let channel_id = required("channelId", channel_id)?;
        Ok(self.store.list_active_by_channel(channel_id).await?)
    }

    pub fn monitoring_status(&self) -> MonitoringStatus {
        self.lifecycle.status()
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ConfigurationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ConfigurationError::MissingIdentifier { field })
    } else {
        Ok(value)
    }
}

fn channel_name(command: &RegisterThermometer) -> Option<String> {
    command
        .channel_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Name used when the caller could not resolve the channel name
fn fallback_channel_name(channel_id: &str) -> String {
    let chars: Vec<char> = channel_id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
    format!("channel-{}", tail)
}
