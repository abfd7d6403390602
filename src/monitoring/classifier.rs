//! Threshold classification of a temperature reading

use serde::Serialize;
use utoipa::ToSchema;

use super::reading::Reading;
use crate::domain::thermometer::Thresholds;

/// Status level, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// No reading available
    Unknown,
    Normal,
    /// Within the warning margin of a bound
    Warning,
    /// At or above `max`, or below `min`
    Danger,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Unknown => "unknown",
            StatusLevel::Normal => "normal",
            StatusLevel::Warning => "warning",
            StatusLevel::Danger => "danger",
        }
    }

    /// Display tag
    pub fn emoji(&self) -> &'static str {
        match self {
            StatusLevel::Unknown => "❓",
            StatusLevel::Normal => "🟢",
            StatusLevel::Warning => "🟡",
            StatusLevel::Danger => "🔴",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result with a human-readable message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureStatus {
    pub level: StatusLevel,
    pub message: String,
}

impl TemperatureStatus {
    fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn emoji(&self) -> &'static str {
        self.level.emoji()
    }
}

/// Classify a reading against a device's thresholds
///
/// Danger checks run before warning checks. A value exactly at `max` is
/// `Danger`; a value exactly at `min` is still inside the range and falls
/// into the lower warning band. A non-finite reading is treated as missing.
pub fn classify(reading: Option<&Reading>, thresholds: &Thresholds) -> TemperatureStatus {
    let celsius = match reading.map(|r| r.celsius).filter(|c| c.is_finite()) {
        Some(c) => c,
        None => return TemperatureStatus::new(StatusLevel::Unknown, "no temperature data"),
    };

    let Thresholds {
        min_temp,
        max_temp,
        warning_margin,
    } = *thresholds;

    if celsius >= max_temp {
        TemperatureStatus::new(
            StatusLevel::Danger,
            format!("at or above maximum temperature ({max_temp}°C)"),
        )
    } else if celsius < min_temp {
        TemperatureStatus::new(
            StatusLevel::Danger,
            format!("below minimum temperature ({min_temp}°C)"),
        )
    } else if celsius >= max_temp - warning_margin || celsius <= min_temp + warning_margin {
        TemperatureStatus::new(StatusLevel::Warning, "approaching temperature threshold")
    } else {
        TemperatureStatus::new(StatusLevel::Normal, "normal")
    }
}
