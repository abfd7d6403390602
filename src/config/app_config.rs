use std::env;
use std::time::Duration;

use crate::domain::thermometer::policy::INTERVAL_FLOOR_SECS;
use crate::monitoring::engine::{DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_CONCURRENCY};
use crate::monitoring::lifecycle::DEFAULT_TICK_INTERVAL;
use crate::monitoring::tuya_client::{TuyaConfig, TUYA_BASE_URL};

/// Default anti-abuse floor for per-device poll intervals (seconds)
pub const DEFAULT_MIN_INTERVAL_SECS: u32 = INTERVAL_FLOOR_SECS;

/// Process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,

    // Monitoring
    pub tick_interval: Duration,
    pub max_concurrency: usize,
    pub min_interval_secs: u32,
    /// Upper bound for one vendor or alert HTTP call
    pub call_timeout: Duration,

    /// MySQL URL; the in-memory registry is used when absent
    pub database_url: Option<String>,

    pub tuya: TuyaConfig,
    /// Slack bot token; alerts are disabled when absent
    pub slack_bot_token: Option<String>,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let server_port = match var("SERVER_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidPort(v))?,
            None => 8080,
        };

        let tick_secs: u64 = parse_or(&var, "MONITOR_TICK_SECS", DEFAULT_TICK_INTERVAL.as_secs())?;
        if tick_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "MONITOR_TICK_SECS",
                value: "0".to_string(),
            });
        }

        let max_concurrency: usize =
            parse_or(&var, "MONITOR_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;
        let min_interval_secs: u32 =
            parse_or(&var, "MONITOR_MIN_INTERVAL_SECS", DEFAULT_MIN_INTERVAL_SECS)?;

        let call_timeout_secs: u64 =
            parse_or(&var, "MONITOR_CALL_TIMEOUT_SECS", DEFAULT_CALL_TIMEOUT.as_secs())?;

        let access_key = var("TUYA_ACCESS_KEY").unwrap_or_else(|| {
            tracing::warn!("TUYA_ACCESS_KEY is not set; device status requests will be rejected.");
            String::new()
        });
        let secret_key = var("TUYA_SECRET_KEY").unwrap_or_else(|| {
            tracing::warn!("TUYA_SECRET_KEY is not set; device status requests will be rejected.");
            String::new()
        });

        Ok(Self {
            server_port,
            tick_interval: Duration::from_secs(tick_secs),
            max_concurrency: max_concurrency.max(1),
            min_interval_secs: min_interval_secs.max(1),
            call_timeout: Duration::from_secs(call_timeout_secs.max(1)),
            database_url: var("DATABASE_URL"),
            tuya: TuyaConfig {
                base_url: var("TUYA_BASE_URL").unwrap_or_else(|| TUYA_BASE_URL.to_string()),
                access_key,
                secret_key,
            },
            slack_bot_token: var("SLACK_BOT_TOKEN"),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn should_apply_defaults_when_unset() {
        // Act
        let config = load(&[]).unwrap();

        // Assert
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.tick_interval, Duration::from_secs(10));
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.min_interval_secs, 5);
        assert_eq!(config.call_timeout, Duration::from_secs(20));
        assert!(config.database_url.is_none());
        assert!(config.slack_bot_token.is_none());
        assert_eq!(config.tuya.base_url, TUYA_BASE_URL);
    }

    #[test]
    fn should_read_overrides() {
        let config = load(&[
            ("SERVER_PORT", "9090"),
            ("MONITOR_TICK_SECS", "30"),
            ("MONITOR_MAX_CONCURRENCY", "16"),
            ("MONITOR_MIN_INTERVAL_SECS", "60"),
            ("MONITOR_CALL_TIMEOUT_SECS", "5"),
            ("DATABASE_URL", "mysql://user:pw@localhost/thermo"),
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("TUYA_ACCESS_KEY", "ak"),
            ("TUYA_SECRET_KEY", "sk"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 9090);
        assert_eq!(config.tick_interval, Duration::from_secs(30));
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.min_interval_secs, 60);
        assert_eq!(config.call_timeout, Duration::from_secs(5));
        assert_eq!(
            config.database_url.as_deref(),
            Some("mysql://user:pw@localhost/thermo")
        );
        assert_eq!(config.slack_bot_token.as_deref(), Some("xoxb-test"));
        assert_eq!(config.tuya.access_key, "ak");
    }

    #[test]
    fn should_treat_blank_values_as_unset() {
        let config = load(&[("DATABASE_URL", "  "), ("SLACK_BOT_TOKEN", "")]).unwrap();

        assert!(config.database_url.is_none());
        assert!(config.slack_bot_token.is_none());
    }

    #[test]
    fn should_reject_unparsable_numbers() {
        let port = load(&[("SERVER_PORT", "http")]);
        let tick = load(&[("MONITOR_TICK_SECS", "0")]);
        let concurrency = load(&[("MONITOR_MAX_CONCURRENCY", "-1")]);

        assert!(matches!(port, Err(ConfigError::InvalidPort(_))));
        assert!(matches!(tick, Err(ConfigError::InvalidNumber { key: "MONITOR_TICK_SECS", .. })));
        assert!(matches!(
            concurrency,
            Err(ConfigError::InvalidNumber { key: "MONITOR_MAX_CONCURRENCY", .. })
        ));
    }
}
