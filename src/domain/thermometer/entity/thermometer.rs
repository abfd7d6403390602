use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thermometer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub thermometer_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub is_active: bool,
    /// Seconds
    pub monitoring_interval: i32,
    pub min_temp: f64,
    pub max_temp: f64,
    pub warning_temp: f64,
    pub last_checked_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
