//! Thermometer registrations: model, threshold policy, stores, service, HTTP
pub mod db_store;
pub mod dto;
pub mod entity;
pub mod error;
pub mod handler;
pub mod memory_store;
pub mod model;
pub mod policy;
pub mod service;
pub mod store;

pub use db_store::SeaOrmThermometerStore;
pub use error::{ConfigurationError, ThermometerError};
pub use memory_store::InMemoryThermometerStore;
pub use model::{DeviceSettings, MonitoredDevice, Thresholds};
pub use policy::{Bounds, ThresholdPolicy, ThresholdSettings};
pub use service::{RegisterThermometer, ThermometerService};
pub use store::ThermometerStore;
