//! Collaborator interfaces consumed by the monitoring engine

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::classifier::TemperatureStatus;
use super::error::{DispatchError, FetchError, RegistryError};
use super::reading::{RawStatus, Reading};
use crate::domain::thermometer::MonitoredDevice;

/// Source of the persisted set of monitored devices
///
/// Read on every tick; implementations must tolerate concurrent
/// registration changes.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// All active devices
    async fn list_active(&self) -> Result<Vec<MonitoredDevice>, RegistryError>;

    /// Number of active devices
    async fn count_active(&self) -> Result<usize, RegistryError>;

    /// Record a successful poll for the `(thermometer_id, channel_id)` pair
    async fn update_last_check(
        &self,
        thermometer_id: &str,
        channel_id: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError>;
}

/// Supplies the current raw status of a device
#[async_trait]
pub trait DeviceStatusFetcher: Send + Sync {
    async fn fetch(&self, device_id: &str) -> Result<RawStatus, FetchError>;
}

/// Delivers an alert for a classified reading
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        device: &MonitoredDevice,
        reading: Option<&Reading>,
        status: &TemperatureStatus,
    ) -> Result<(), DispatchError>;
}
