use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::model::MonitoredDevice;
use crate::monitoring::MonitoringStatus;
use super::policy::ThresholdSettings;
use super::service::RegisterThermometer;

/// Thermometer registration request
///
/// Omitted settings take the policy defaults; out-of-range values are clamped.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterThermometerRequest {
    #[validate(length(min = 1, max = 64, message = "thermometerId must be 1-64 characters"))]
    #[schema(example = "bf1234abcd")]
    pub thermometer_id: String,

    #[validate(length(min = 1, max = 64, message = "channelId must be 1-64 characters"))]
    #[schema(example = "C0123456789")]
    pub channel_id: String,

    #[validate(length(max = 80, message = "channelName must not exceed 80 characters"))]
    pub channel_name: Option<String>,

    /// Poll interval in seconds
    #[schema(example = 60)]
    pub monitoring_interval: Option<f64>,
    #[schema(example = 18.0)]
    pub min_temp: Option<f64>,
    #[schema(example = 27.0)]
    pub max_temp: Option<f64>,
    /// Warning margin from either bound (°C)
    #[schema(example = 2.0)]
    pub warning_temp: Option<f64>,
}

impl From<RegisterThermometerRequest> for RegisterThermometer {
    fn from(req: RegisterThermometerRequest) -> Self {
        Self {
            thermometer_id: req.thermometer_id,
            channel_id: req.channel_id,
            channel_name: req.channel_name,
            settings: ThresholdSettings {
                monitoring_interval: req.monitoring_interval,
                min_temp: req.min_temp,
                max_temp: req.max_temp,
                warning_temp: req.warning_temp,
            },
        }
    }
}

/// Channel to unregister from
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterQuery {
    #[validate(length(min = 1, message = "channelId is required"))]
    pub channel_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThermometerResponse {
    pub thermometer_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub is_active: bool,
    #[schema(example = 60)]
    pub monitoring_interval: u32,
    pub min_temp: f64,
    pub max_temp: f64,
    pub warning_temp: f64,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MonitoredDevice> for ThermometerResponse {
    fn from(device: MonitoredDevice) -> Self {
        Self {
            thermometer_id: device.thermometer_id,
            channel_id: device.channel_id,
            channel_name: device.channel_name,
            is_active: device.is_active,
            monitoring_interval: device.monitoring_interval,
            min_temp: device.thresholds.min_temp,
            max_temp: device.thresholds.max_temp,
            warning_temp: device.thresholds.warning_margin,
            last_checked_at: device.last_checked_at,
            created_at: device.created_at,
            updated_at: device.updated_at,
        }
    }
}

/// Success envelope (Swagger only)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessThermometerResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: ThermometerResponse,
}

/// Success envelope (Swagger only)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessThermometerListResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Vec<ThermometerResponse>,
}

/// Success envelope (Swagger only)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessMonitoringStatusResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: MonitoringStatus,
}
