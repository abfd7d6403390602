//! Registry backed by the `thermometer` table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use super::entity::thermometer;
use super::model::{MonitoredDevice, Thresholds};
use super::policy::INTERVAL_FLOOR_SECS;
use super::store::ThermometerStore;
use crate::monitoring::{RegistryError, RegistryGateway};

pub struct SeaOrmThermometerStore {
    db: DatabaseConnection,
}

impl SeaOrmThermometerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        thermometer_id: &str,
        channel_id: &str,
    ) -> Result<Option<thermometer::Model>, RegistryError> {
        Ok(thermometer::Entity::find()
            .filter(thermometer::Column::ThermometerId.eq(thermometer_id))
            .filter(thermometer::Column::ChannelId.eq(channel_id))
            .one(&self.db)
            .await?)
    }
}

impl From<thermometer::Model> for MonitoredDevice {
    fn from(model: thermometer::Model) -> Self {
        Self {
            thermometer_id: model.thermometer_id,
            channel_id: model.channel_id,
            channel_name: model.channel_name,
            is_active: model.is_active,
            monitoring_interval: stored_interval(model.monitoring_interval),
            thresholds: Thresholds {
                min_temp: model.min_temp,
                max_temp: model.max_temp,
                warning_margin: model.warning_temp,
            },
            last_checked_at: model.last_checked_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Rows edited outside the API may hold zero or negative intervals
fn stored_interval(column: i32) -> u32 {
    u32::try_from(column)
        .unwrap_or_default()
        .max(INTERVAL_FLOOR_SECS)
}

fn interval_column(seconds: u32) -> i32 {
    i32::try_from(seconds).unwrap_or(i32::MAX)
}

#[async_trait]
impl RegistryGateway for SeaOrmThermometerStore {
    async fn list_active(&self) -> Result<Vec<MonitoredDevice>, RegistryError> {
        let models = thermometer::Entity::find()
            .filter(thermometer::Column::IsActive.eq(true))
            .order_by_desc(thermometer::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(MonitoredDevice::from).collect())
    }

    async fn count_active(&self) -> Result<usize, RegistryError> {
        let count = thermometer::Entity::find()
            .filter(thermometer::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    async fn update_last_check(
        &self,
        thermometer_id: &str,
        channel_id: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let result = thermometer::Entity::update_many()
            .col_expr(thermometer::Column::LastCheckedAt, Expr::value(checked_at))
            .filter(thermometer::Column::ThermometerId.eq(thermometer_id))
            .filter(thermometer::Column::ChannelId.eq(channel_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RegistryError::NotFound {
                thermometer_id: thermometer_id.to_string(),
                channel_id: channel_id.to_string(),
            });
        }

        debug!(thermometer_id, channel_id, "Last check timestamp persisted");
        Ok(())
    }
}

#[async_trait]
impl ThermometerStore for SeaOrmThermometerStore {
    async fn find(
        &self,
        thermometer_id: &str,
        channel_id: &str,
    ) -> Result<Option<MonitoredDevice>, RegistryError> {
        Ok(self
            .find_model(thermometer_id, channel_id)
            .await?
            .map(MonitoredDevice::from))
    }

    async fn insert(&self, device: MonitoredDevice) -> Result<MonitoredDevice, RegistryError> {
        if self
            .find_model(&device.thermometer_id, &device.channel_id)
            .await?
            .is_some()
        {
            return Err(RegistryError::Conflict {
                thermometer_id: device.thermometer_id,
                channel_id: device.channel_id,
            });
        }

        let model = thermometer::ActiveModel {
            thermometer_id: Set(device.thermometer_id),
            channel_id: Set(device.channel_id),
            channel_name: Set(device.channel_name),
            is_active: Set(device.is_active),
            monitoring_interval: Set(interval_column(device.monitoring_interval)),
            min_temp: Set(device.thresholds.min_temp),
            max_temp: Set(device.thresholds.max_temp),
            warning_temp: Set(device.thresholds.warning_margin),
            last_checked_at: Set(device.last_checked_at),
            created_at: Set(device.created_at),
            updated_at: Set(device.updated_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn update(&self, device: MonitoredDevice) -> Result<MonitoredDevice, RegistryError> {
        let existing = self
            .find_model(&device.thermometer_id, &device.channel_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                thermometer_id: device.thermometer_id.clone(),
                channel_id: device.channel_id.clone(),
            })?;

        let mut active: thermometer::ActiveModel = existing.into();
        active.channel_name = Set(device.channel_name);
        active.is_active = Set(device.is_active);
        active.monitoring_interval = Set(interval_column(device.monitoring_interval));
        active.min_temp = Set(device.thresholds.min_temp);
        active.max_temp = Set(device.thresholds.max_temp);
        active.warning_temp = Set(device.thresholds.warning_margin);
        active.updated_at = Set(device.updated_at);

        let model = active.update(&self.db).await?;
        Ok(model.into())
    }

    async fn list_active_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<MonitoredDevice>, RegistryError> {
        let models = thermometer::Entity::find()
            .filter(thermometer::Column::ChannelId.eq(channel_id))
            .filter(thermometer::Column::IsActive.eq(true))
            .order_by_desc(thermometer::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(MonitoredDevice::from).collect())
    }
}
