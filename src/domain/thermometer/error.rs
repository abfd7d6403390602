use crate::monitoring::RegistryError;

/// Invalid registration settings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{field} must not be empty")]
    MissingIdentifier { field: &'static str },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("minimum temperature ({min}°C) is greater than maximum temperature ({max}°C)")]
    InvertedRange { min: f64, max: f64 },
}

/// Registration / unregistration failures
#[derive(Debug, thiserror::Error)]
pub enum ThermometerError {
    #[error("thermometer {thermometer_id} is already active in channel {channel_id}")]
    AlreadyActive {
        thermometer_id: String,
        channel_id: String,
    },
    #[error("thermometer {thermometer_id} is not registered in channel {channel_id}")]
    NotRegistered {
        thermometer_id: String,
        channel_id: String,
    },
    #[error("thermometer {thermometer_id} is already unregistered from channel {channel_id}")]
    AlreadyInactive {
        thermometer_id: String,
        channel_id: String,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
