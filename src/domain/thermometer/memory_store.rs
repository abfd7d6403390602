//! In-process registry, used when no database is configured

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::model::MonitoredDevice;
use super::store::ThermometerStore;
use crate::monitoring::{RegistryError, RegistryGateway};

#[derive(Debug, Default)]
pub struct InMemoryThermometerStore {
    devices: RwLock<Vec<MonitoredDevice>>,
}

impl InMemoryThermometerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut devices: Vec<MonitoredDevice>) -> Vec<MonitoredDevice> {
    devices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    devices
}

fn not_found(thermometer_id: &str, channel_id: &str) -> RegistryError {
    RegistryError::NotFound {
        thermometer_id: thermometer_id.to_string(),
        channel_id: channel_id.to_string(),
    }
}

#[async_trait]
impl RegistryGateway for InMemoryThermometerStore {
    async fn list_active(&self) -> Result<Vec<MonitoredDevice>, RegistryError> {
        let devices = self.devices.read().await;
        Ok(newest_first(
            devices.iter().filter(|d| d.is_active).cloned().collect(),
        ))
    }

    async fn count_active(&self) -> Result<usize, RegistryError> {
        Ok(self.devices.read().await.iter().filter(|d| d.is_active).count())
    }

    async fn update_last_check(
        &self,
        thermometer_id: &str,
        channel_id: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut devices = self.devices.write().await;
        let device = devices
            .iter_mut()
            .find(|d| d.matches(thermometer_id, channel_id))
            .ok_or_else(|| not_found(thermometer_id, channel_id))?;
        device.last_checked_at = Some(checked_at);
        Ok(())
    }
}

#[async_trait]
impl ThermometerStore for InMemoryThermometerStore {
    async fn find(
        &self,
        thermometer_id: &str,
        channel_id: &str,
    ) -> Result<Option<MonitoredDevice>, RegistryError> {
        let devices = self.devices.read().await;
        Ok(devices
            .iter()
            .find(|d| d.matches(thermometer_id, channel_id))
            .cloned())
    }

    async fn insert(&self, device: MonitoredDevice) -> Result<MonitoredDevice, RegistryError> {
        let mut devices = self.devices.write().await;
        if devices
            .iter()
            .any(|d| d.matches(&device.thermometer_id, &device.channel_id))
        {
            return Err(RegistryError::Conflict {
                thermometer_id: device.thermometer_id,
                channel_id: device.channel_id,
            });
        }
        devices.push(device.clone());
        Ok(device)
    }

    async fn update(&self, device: MonitoredDevice) -> Result<MonitoredDevice, RegistryError> {
        let mut devices = self.devices.write().await;
        let stored = devices
            .iter_mut()
            .find(|d| d.matches(&device.thermometer_id, &device.channel_id))
            .ok_or_else(|| not_found(&device.thermometer_id, &device.channel_id))?;

        let last_checked_at = stored.last_checked_at;
        *stored = MonitoredDevice {
            last_checked_at,
            ..device
        };
        Ok(stored.clone())
    }

    async fn list_active_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<MonitoredDevice>, RegistryError> {
        let devices = self.devices.read().await;
        Ok(newest_first(
            devices
                .iter()
                .filter(|d| d.is_active && d.channel_id == channel_id)
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::thermometer::{DeviceSettings, Thresholds};
    use chrono::Duration;

    fn device(id: &str, channel: &str, created_at: DateTime<Utc>) -> MonitoredDevice {
        MonitoredDevice::new(
            id,
            channel,
            "ops",
            DeviceSettings {
                monitoring_interval: 10,
                thresholds: Thresholds {
                    min_temp: 10.0,
                    max_temp: 30.0,
                    warning_margin: 5.0,
                },
            },
            created_at,
        )
    }

    #[tokio::test]
    async fn should_reject_duplicate_pair() {
        let store = InMemoryThermometerStore::new();
        let now = Utc::now();
        store.insert(device("T1", "C1", now)).await.unwrap();

        let result = store.insert(device("T1", "C1", now)).await;

        assert!(matches!(result, Err(RegistryError::Conflict { .. })));
    }

    #[tokio::test]
    async fn should_allow_same_thermometer_in_two_channels() {
        let store = InMemoryThermometerStore::new();
        let now = Utc::now();

        store.insert(device("T1", "C1", now)).await.unwrap();
        store.insert(device("T1", "C2", now)).await.unwrap();

        assert_eq!(store.count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn should_list_active_newest_first_and_skip_inactive() {
        // Arrange
        let store = InMemoryThermometerStore::new();
        let now = Utc::now();
        store.insert(device("old", "C1", now - Duration::hours(1))).await.unwrap();
        store.insert(device("new", "C1", now)).await.unwrap();
        let mut gone = device("gone", "C1", now);
        gone.is_active = false;
        store.insert(gone).await.unwrap();

        // Act
        let active = store.list_active_by_channel("C1").await.unwrap();

        // Assert
        let ids: Vec<_> = active.iter().map(|d| d.thermometer_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(store.count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn should_keep_last_check_on_update() {
        let store = InMemoryThermometerStore::new();
        let now = Utc::now();
        store.insert(device("T1", "C1", now)).await.unwrap();
        store.update_last_check("T1", "C1", now).await.unwrap();

        let mut changed = device("T1", "C1", now);
        changed.monitoring_interval = 60;
        let updated = store.update(changed).await.unwrap();

        assert_eq!(updated.monitoring_interval, 60);
        assert_eq!(updated.last_checked_at, Some(now));
    }

    #[tokio::test]
    async fn should_fail_last_check_update_for_unknown_pair() {
        let store = InMemoryThermometerStore::new();

        let result = store.update_last_check("T1", "C1", Utc::now()).await;

        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    }
}
