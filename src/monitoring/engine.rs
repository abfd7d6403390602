//! Monitoring engine: one tick cycle over every active device
//!
//! For each due device the check runs strictly in order:
//! fetch -> extract -> classify -> dispatch -> persist last check.
//! Devices are isolated from each other; a failure is logged and only
//! affects the device it happened on.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use super::classifier::{classify, StatusLevel};
use super::clock::Clock;
use super::error::{DispatchError, FetchError, RegistryError};
use super::interval_gate::is_due;
use super::ports::{AlertDispatcher, DeviceStatusFetcher, RegistryGateway};
use super::reading::extract_reading;
use crate::domain::thermometer::MonitoredDevice;

/// Default number of devices checked concurrently within one tick
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Upper bound for a single fetch or dispatch call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(20);

/// Result of checking a single device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Interval has not elapsed yet
    NotDue,
    /// Status could not be fetched; last check left unchanged
    FetchFailed,
    /// Alert delivered
    Alerted(StatusLevel),
    /// Poll succeeded but the alert was not delivered
    DispatchFailed(StatusLevel),
}

/// Per-tick counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Active devices seen this tick
    pub devices: usize,
    pub due: usize,
    pub alerted: usize,
    pub fetch_failures: usize,
    pub dispatch_failures: usize,
    /// Set when the tick was skipped because the previous one was still running
    pub overlapped: bool,
}

impl TickReport {
    fn record(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::NotDue => {}
            CheckOutcome::FetchFailed => {
                self.due += 1;
                self.fetch_failures += 1;
            }
            CheckOutcome::Alerted(_) => {
                self.due += 1;
                self.alerted += 1;
            }
            CheckOutcome::DispatchFailed(_) => {
                self.due += 1;
                self.dispatch_failures += 1;
            }
        }
    }
}

/// Polls, classifies and alerts for every active device
pub struct MonitoringEngine {
    registry: Arc<dyn RegistryGateway>,
    fetcher: Arc<dyn DeviceStatusFetcher>,
    dispatcher: Arc<dyn AlertDispatcher>,
    clock: Arc<dyn Clock>,
    max_concurrency: usize,
    call_timeout: Duration,
    /// Held for the whole cycle so two ticks never poll the same device at once
    tick_lock: Mutex<()>,
}

impl MonitoringEngine {
    pub fn new(
        registry: Arc<dyn RegistryGateway>,
        fetcher: Arc<dyn DeviceStatusFetcher>,
        dispatcher: Arc<dyn AlertDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            dispatcher,
            clock,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            tick_lock: Mutex::new(()),
        }
    }

    /// Bound the per-tick fan-out (at least 1)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Bound every fetch and dispatch call; a hung call counts as a
    /// transport failure for that device only
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run one tick over the current active device set
    ///
    /// The device set is re-read from the registry every time. If a previous
    /// cycle is still in progress this one is skipped and reported as
    /// `overlapped`. Only a registry read failure is returned as an error;
    /// device-level failures are counted in the report.
    #[instrument(skip(self), level = "debug")]
    pub async fn run_tick_cycle(&self) -> Result<TickReport, RegistryError> {
        let _guard = match self.tick_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Previous monitoring tick still running, skipping this tick");
                return Ok(TickReport {
                    overlapped: true,
                    ..TickReport::default()
                });
            }
        };

        let now = self.clock.now();
        let devices = self.registry.list_active().await?;

        let mut report = TickReport {
            devices: devices.len(),
            ..TickReport::default()
        };

        if devices.is_empty() {
            debug!("No active thermometers to monitor");
            return Ok(report);
        }

        debug!(devices = devices.len(), "Monitoring tick started");

        let outcomes: Vec<CheckOutcome> = stream::iter(devices)
            .map(|device| async move { self.check_device(&device, now).await })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            report.record(outcome);
        }

        if report.due > 0 {
            info!(
                devices = report.devices,
                due = report.due,
                alerted = report.alerted,
                fetch_failures = report.fetch_failures,
                dispatch_failures = report.dispatch_failures,
                "Monitoring tick completed"
            );
        }

        Ok(report)
    }

    /// Check a single device if it is due at `now`
    #[instrument(
        skip(self, device),
        fields(thermometer_id = %device.thermometer_id, channel_id = %device.channel_id)
    )]
    pub async fn check_device(&self, device: &MonitoredDevice, now: DateTime<Utc>) -> CheckOutcome {
        if !is_due(now, device.last_checked_at, device.monitoring_interval) {
            return CheckOutcome::NotDue;
        }

        let fetched = timeout(self.call_timeout, self.fetcher.fetch(&device.thermometer_id))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Transport(format!(
                    "timed out after {}s",
                    self.call_timeout.as_secs()
                )))
            });
        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Thermometer status fetch failed, retrying on next due tick");
                return CheckOutcome::FetchFailed;
            }
        };

        let reading = extract_reading(&raw);
        let status = classify(reading.as_ref(), &device.thresholds);

        info!(
            celsius = ?reading.as_ref().map(|r| r.celsius),
            status = %status.level,
            "Thermometer reading collected"
        );

        let dispatched = timeout(
            self.call_timeout,
            self.dispatcher.dispatch(device, reading.as_ref(), &status),
        )
        .await
        .unwrap_or_else(|_| {
            Err(DispatchError::Transport(format!(
                "timed out after {}s",
                self.call_timeout.as_secs()
            )))
        });

        let outcome = match dispatched {
            Ok(()) => CheckOutcome::Alerted(status.level),
            Err(e) => {
                error!(error = %e, "Temperature alert delivery failed");
                CheckOutcome::DispatchFailed(status.level)
            }
        };

        // the poll succeeded, so the cadence advances even if delivery failed
        if let Err(e) = self
            .registry
            .update_last_check(&device.thermometer_id, &device.channel_id, now)
            .await
        {
            error!(error = %e, "Failed to persist last check timestamp");
        }

        outcome
    }
}
