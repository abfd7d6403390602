//! Starts and stops the shared monitoring tick
//!
//! State machine: `Stopped --start()--> Running --stop()--> Stopped`.
//! `start()` while running and `stop()` while stopped are no-ops.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use super::engine::MonitoringEngine;
use super::error::RegistryError;
use super::ports::RegistryGateway;

/// Default tick cadence
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Stopped,
    Running,
}

/// Diagnostics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStatus {
    pub running: bool,
    #[schema(example = 10)]
    pub tick_interval_secs: u64,
}

/// Handle of a spawned tick loop
struct TickLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the tick loop of a [`MonitoringEngine`]
pub struct LifecycleController {
    engine: Arc<MonitoringEngine>,
    registry: Arc<dyn RegistryGateway>,
    tick_interval: Duration,
    tick_loop: Mutex<Option<TickLoop>>,
}

impl LifecycleController {
    pub fn new(
        engine: Arc<MonitoringEngine>,
        registry: Arc<dyn RegistryGateway>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            engine,
            registry,
            tick_interval,
            tick_loop: Mutex::new(None),
        }
    }

    /// Start the tick loop; returns `false` if it was already running
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut slot = self.slot();
        if slot.is_some() {
            debug!("Monitoring already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_tick_loop(
            self.engine.clone(),
            self.tick_interval,
            cancel.clone(),
        ));
        *slot = Some(TickLoop { cancel, handle });

        info!(
            tick_interval_secs = self.tick_interval.as_secs(),
            "Monitoring started"
        );
        true
    }

    /// Stop the tick loop; returns `false` if it was not running
    ///
    /// No new tick starts after this returns. A tick already in progress is
    /// allowed to finish in the background.
    pub fn stop(&self) -> bool {
        match self.slot().take() {
            Some(tick_loop) => {
                tick_loop.cancel.cancel();
                info!("Monitoring stopped");
                true
            }
            None => {
                debug!("Monitoring already stopped");
                false
            }
        }
    }

    /// Stop and wait for an in-flight tick to finish
    pub async fn shutdown(&self) {
        let tick_loop = self.slot().take();
        if let Some(TickLoop { cancel, handle }) = tick_loop {
            cancel.cancel();
            if let Err(e) = handle.await {
                error!(error = %e, "Monitoring loop terminated abnormally");
            }
            info!("Monitoring shut down");
        }
    }

    pub fn state(&self) -> LifecycleState {
        if self.slot().is_some() {
            LifecycleState::Running
        } else {
            LifecycleState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn status(&self) -> MonitoringStatus {
        MonitoringStatus {
            running: self.is_running(),
            tick_interval_secs: self.tick_interval.as_secs(),
        }
    }

    /// A device was registered: make sure monitoring runs
    pub fn on_device_registered(&self) {
        if self.start() {
            info!("Thermometer registered, monitoring started");
        }
    }

    /// A device was unregistered: stop monitoring once none are left
    pub async fn on_device_unregistered(&self) -> Result<(), RegistryError> {
        let active = self.registry.count_active().await?;
        if active == 0 {
            info!("No active thermometers left, stopping monitoring");
            self.stop();
        } else {
            info!(active, "Thermometers still registered, monitoring continues");
        }
        Ok(())
    }

    /// Start monitoring if the registry already holds active devices
    pub async fn resume_if_active(&self) -> Result<bool, RegistryError> {
        let active = self.registry.count_active().await?;
        if active > 0 {
            info!(active, "Resuming monitoring for registered thermometers");
            self.start();
        }
        Ok(self.is_running())
    }

    fn slot(&self) -> MutexGuard<'_, Option<TickLoop>> {
        self.tick_loop.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        if let Some(tick_loop) = self.slot().take() {
            tick_loop.cancel.cancel();
        }
    }
}

async fn run_tick_loop(
    engine: Arc<MonitoringEngine>,
    tick_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Monitoring tick loop cancelled");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = engine.run_tick_cycle().await {
                    error!(error = %e, "Monitoring tick failed to read registry");
                }
            }
        }
    }
}
