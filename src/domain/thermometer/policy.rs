//! Threshold defaults, numeric bounds and registration-time validation

use super::error::ConfigurationError;
use super::model::{DeviceSettings, Thresholds};

/// Poll interval floor applied when no stricter one is configured
pub const INTERVAL_FLOOR_SECS: u32 = 5;

/// Inclusive numeric range used for clamping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Settings supplied with a registration; `None` keeps the base value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdSettings {
    pub monitoring_interval: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub warning_temp: Option<f64>,
}

/// Defaults and bounds applied to every registration
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    pub defaults: DeviceSettings,
    /// Poll interval bounds in seconds; `min` is the anti-abuse floor
    pub interval: Bounds,
    pub temperature: Bounds,
    pub warning_margin: Bounds,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            defaults: DeviceSettings {
                monitoring_interval: 10,
                thresholds: Thresholds {
                    min_temp: 10.0,
                    max_temp: 30.0,
                    warning_margin: 5.0,
                },
            },
            interval: Bounds::new(INTERVAL_FLOOR_SECS as f64, 3600.0),
            temperature: Bounds::new(-50.0, 100.0),
            warning_margin: Bounds::new(1.0, 20.0),
        }
    }
}

impl ThresholdPolicy {
    /// Override the poll interval floor
    ///
    /// The default interval is raised to the floor when it falls below it.
    pub fn with_min_interval(mut self, floor_secs: u32) -> Self {
        self.interval.min = f64::from(floor_secs.max(1));
        if self.interval.max < self.interval.min {
            self.interval.max = self.interval.min;
        }
        self.defaults.monitoring_interval = self
            .defaults
            .monitoring_interval
            .max(floor_secs.max(1));
        self
    }

    /// Resolve settings over the policy defaults
    pub fn resolve(&self, settings: &ThresholdSettings) -> Result<DeviceSettings, ConfigurationError> {
        self.resolve_over(self.defaults, settings)
    }

    /// Resolve settings over an existing device's values
    ///
    /// Each supplied value is clamped into its bounds independently; the
    /// resulting range is then rejected if `min > max`.
    pub fn resolve_over(
        &self,
        base: DeviceSettings,
        settings: &ThresholdSettings,
    ) -> Result<DeviceSettings, ConfigurationError> {
        let interval = match settings.monitoring_interval {
            Some(v) => self.interval.clamp(finite("monitoringInterval", v)?).round() as u32,
            None => base.monitoring_interval,
        };
        let min_temp = match settings.min_temp {
            Some(v) => self.temperature.clamp(finite("minTemp", v)?),
            None => base.thresholds.min_temp,
        };
        let max_temp = match settings.max_temp {
            Some(v) => self.temperature.clamp(finite("maxTemp", v)?),
            None => base.thresholds.max_temp,
        };
        let warning_margin = match settings.warning_temp {
            Some(v) => self.warning_margin.clamp(finite("warningTemp", v)?),
            None => base.thresholds.warning_margin,
        };

        if min_temp > max_temp {
            return Err(ConfigurationError::InvertedRange {
                min: min_temp,
                max: max_temp,
            });
        }

        Ok(DeviceSettings {
            monitoring_interval: interval,
            thresholds: Thresholds {
                min_temp,
                max_temp,
                warning_margin,
            },
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::NotFinite { field })
    }
}
