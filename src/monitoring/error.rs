//! Errors reported by the monitoring collaborators
//!
//! None of these is fatal: the engine logs them per device and keeps ticking.

/// Device status could not be obtained
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("device status request failed: {0}")]
    Transport(String),
    #[error("vendor API rejected the request: {0}")]
    Rejected(String),
    #[error("malformed device status payload: {0}")]
    Malformed(String),
    #[error("unknown device: {0}")]
    UnknownDevice(String),
}

/// Alert could not be delivered
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("alert delivery failed: {0}")]
    Transport(String),
    #[error("alert target rejected the message: {0}")]
    Rejected(String),
}

/// Device registry could not be read or written
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("registry storage error: {0}")]
    Storage(String),
    #[error("thermometer {thermometer_id} already exists in channel {channel_id}")]
    Conflict {
        thermometer_id: String,
        channel_id: String,
    },
    #[error("thermometer {thermometer_id} not found in channel {channel_id}")]
    NotFound {
        thermometer_id: String,
        channel_id: String,
    },
}

impl From<sea_orm::DbErr> for RegistryError {
    fn from(err: sea_orm::DbErr) -> Self {
        RegistryError::Storage(err.to_string())
    }
}
