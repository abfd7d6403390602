#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thermo_watch::domain::thermometer::{DeviceSettings, MonitoredDevice, Thresholds};
use thermo_watch::monitoring::{
    AlertDispatcher, DeviceStatusFetcher, DispatchError, FetchError, RawStatus, Reading,
    StatusLevel, TemperatureStatus,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn settings(interval: u32) -> DeviceSettings {
    DeviceSettings {
        monitoring_interval: interval,
        thresholds: Thresholds {
            min_temp: 10.0,
            max_temp: 30.0,
            warning_margin: 5.0,
        },
    }
}

pub fn device(id: &str, channel: &str, interval: u32) -> MonitoredDevice {
    MonitoredDevice::new(id, channel, "server-room", settings(interval), t0())
}

/// Tuya style `{code, value}` status list carrying a raw temperature
pub fn temperature_payload(raw: f64) -> Value {
    json!([
        { "code": "va_temperature", "value": raw },
        { "code": "battery_percentage", "value": 80 }
    ])
}

/// Scripted device status source
///
/// Each device answers from its queue, then falls back to its default
/// payload. Unknown devices fail with `UnknownDevice`.
#[derive(Default)]
pub struct ScriptedFetcher {
    defaults: Mutex<HashMap<String, Value>>,
    scripts: Mutex<HashMap<String, Vec<Result<Value, FetchError>>>>,
    delays: Mutex<HashMap<String, Duration>>,
    hanging: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, device_id: &str, payload: Value) {
        self.defaults
            .lock()
            .unwrap()
            .insert(device_id.to_string(), payload);
    }

    /// Queue one-shot answers consumed before the default payload
    pub fn script(&self, device_id: &str, answers: Vec<Result<Value, FetchError>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(device_id.to_string(), answers.into_iter().rev().collect());
    }

    pub fn delay(&self, device_id: &str, by: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(device_id.to_string(), by);
    }

    /// Make every fetch for the device wait forever
    pub fn hang(&self, device_id: &str) {
        self.hanging.lock().unwrap().push(device_id.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, device_id: &str) -> usize {
        self.calls().iter().filter(|c| *c == device_id).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceStatusFetcher for ScriptedFetcher {
    async fn fetch(&self, device_id: &str) -> Result<RawStatus, FetchError> {
        self.calls.lock().unwrap().push(device_id.to_string());
        let hangs = self.hanging.lock().unwrap().iter().any(|d| d == device_id);
        if hangs {
            std::future::pending::<()>().await;
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(device_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(device_id)
            .and_then(|queue| queue.pop());
        let answer = match scripted {
            Some(answer) => answer,
            None => self
                .defaults
                .lock()
                .unwrap()
                .get(device_id)
                .cloned()
                .ok_or_else(|| FetchError::UnknownDevice(device_id.to_string())),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer.and_then(RawStatus::from_value)
    }
}

/// One delivered alert
#[derive(Debug, Clone, PartialEq)]
pub struct SentAlert {
    pub thermometer_id: String,
    pub channel_id: String,
    pub celsius: Option<f64>,
    pub level: StatusLevel,
}

/// Alert sink that records everything it is given
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<SentAlert>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make deliveries for this device fail
    pub fn fail_for(&self, device_id: &str) {
        self.failing.lock().unwrap().push(device_id.to_string());
    }

    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_for(&self, device_id: &str) -> Vec<SentAlert> {
        self.sent()
            .into_iter()
            .filter(|a| a.thermometer_id == device_id)
            .collect()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        device: &MonitoredDevice,
        reading: Option<&Reading>,
        status: &TemperatureStatus,
    ) -> Result<(), DispatchError> {
        if self.failing.lock().unwrap().contains(&device.thermometer_id) {
            return Err(DispatchError::Transport("channel unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(SentAlert {
            thermometer_id: device.thermometer_id.clone(),
            channel_id: device.channel_id.clone(),
            celsius: reading.map(|r| r.celsius),
            level: status.level,
        });
        Ok(())
    }
}

/// Wall clock that follows Tokio's (pausable) time
pub struct TokioClock {
    base: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: t0(),
            origin: tokio::time::Instant::now(),
        })
    }
}

impl thermo_watch::monitoring::Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.base + chrono::Duration::milliseconds(elapsed.as_millis() as i64)
    }
}
