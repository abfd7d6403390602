//! Temperature monitoring engine
//!
//! - Threshold classification and per-device interval gating
//! - A shared tick driving poll -> classify -> alert for every due device
//! - Lifecycle control of the tick loop
//! - Tuya status fetcher and Slack alert adapters

pub mod classifier;
pub mod clock;
pub mod engine;
pub mod error;
pub mod interval_gate;
pub mod lifecycle;
pub mod ports;
pub mod reading;
pub mod slack_alert;
pub mod tuya_client;

pub use classifier::{classify, StatusLevel, TemperatureStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{CheckOutcome, MonitoringEngine, TickReport};
pub use error::{DispatchError, FetchError, RegistryError};
pub use interval_gate::is_due;
pub use lifecycle::{LifecycleController, LifecycleState, MonitoringStatus};
pub use ports::{AlertDispatcher, DeviceStatusFetcher, RegistryGateway};
pub use reading::{extract_reading, normalize_celsius, RawStatus, Reading};
pub use slack_alert::SlackAlert;
pub use tuya_client::{TuyaClient, TuyaConfig};
