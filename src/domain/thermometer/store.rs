use async_trait::async_trait;

use super::model::MonitoredDevice;
use crate::monitoring::{RegistryError, RegistryGateway};

/// Persistence of thermometer registrations
///
/// Extends the engine-facing [`RegistryGateway`] with the lookups and
/// writes needed by registration.
#[async_trait]
pub trait ThermometerStore: RegistryGateway {
    /// Record for the pair, active or not
    async fn find(
        &self,
        thermometer_id: &str,
        channel_id: &str,
    ) -> Result<Option<MonitoredDevice>, RegistryError>;

    /// Insert a new record; the pair must not exist yet
    async fn insert(&self, device: MonitoredDevice) -> Result<MonitoredDevice, RegistryError>;

    /// Overwrite the record for the device's pair
    ///
    /// `last_checked_at` is left as stored; it belongs to the engine.
    async fn update(&self, device: MonitoredDevice) -> Result<MonitoredDevice, RegistryError>;

    /// Active records of a channel, newest first
    async fn list_active_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<MonitoredDevice>, RegistryError>;
}
