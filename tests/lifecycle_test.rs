mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{device, temperature_payload, RecordingDispatcher, ScriptedFetcher, TokioClock};
use thermo_watch::domain::thermometer::{
    InMemoryThermometerStore, RegisterThermometer, ThermometerStore,
};
use thermo_watch::monitoring::{LifecycleState, MonitoringStatus};
use thermo_watch::{assemble, AppState, MonitoringOptions};

const TICK: Duration = Duration::from_secs(10);

struct Harness {
    store: Arc<InMemoryThermometerStore>,
    fetcher: Arc<ScriptedFetcher>,
    dispatcher: Arc<RecordingDispatcher>,
    state: AppState,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryThermometerStore::new());
    let fetcher = ScriptedFetcher::new();
    let dispatcher = RecordingDispatcher::new();
    let state = assemble(
        store.clone(),
        fetcher.clone(),
        dispatcher.clone(),
        TokioClock::new(),
        MonitoringOptions {
            tick_interval: TICK,
            ..MonitoringOptions::default()
        },
    );

    Harness {
        store,
        fetcher,
        dispatcher,
        state,
    }
}

fn register(id: &str, channel: &str) -> RegisterThermometer {
    RegisterThermometer {
        thermometer_id: id.to_string(),
        channel_id: channel.to_string(),
        channel_name: Some("server-room".to_string()),
        ..RegisterThermometer::default()
    }
}

mod state_machine {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn should_start_once_when_started_twice() {
        // Arrange
        let h = harness();
        h.store.insert(device("T1", "C1", 10)).await.unwrap();
        h.fetcher.answer("T1", temperature_payload(20.0));

        // Act
        let first = h.state.lifecycle.start();
        let second = h.state.lifecycle.start();
        tokio::time::sleep(Duration::from_secs(25)).await;

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(h.state.lifecycle.state(), LifecycleState::Running);
        assert_eq!(h.fetcher.calls_for("T1"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_treat_stop_while_stopped_as_noop() {
        let h = harness();

        assert!(!h.state.lifecycle.stop());
        assert_eq!(h.state.lifecycle.state(), LifecycleState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_tick_after_stop_and_tick_again_after_restart() {
        // Arrange
        let h = harness();
        h.store.insert(device("T1", "C1", 10)).await.unwrap();
        h.fetcher.answer("T1", temperature_payload(20.0));
        h.state.lifecycle.start();
        tokio::time::sleep(Duration::from_secs(15)).await;

        // Act
        assert!(h.state.lifecycle.stop());
        tokio::time::sleep(Duration::from_secs(60)).await;
        let while_stopped = h.fetcher.calls_for("T1");

        h.state.lifecycle.start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        // Assert
        assert_eq!(while_stopped, 2);
        assert_eq!(h.fetcher.calls_for("T1"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_let_in_flight_tick_finish_after_stop() {
        // Arrange
        let h = harness();
        h.store.insert(device("SLOW", "C1", 10)).await.unwrap();
        h.fetcher.answer("SLOW", temperature_payload(20.0));
        h.fetcher.delay("SLOW", Duration::from_secs(5));
        h.state.lifecycle.start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Act
        h.state.lifecycle.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;

        // Assert
        assert_eq!(h.dispatcher.sent_for("SLOW").len(), 1);
        assert_eq!(h.fetcher.calls_for("SLOW"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_for_in_flight_tick_on_shutdown() {
        let h = harness();
        h.store.insert(device("SLOW", "C1", 10)).await.unwrap();
        h.fetcher.answer("SLOW", temperature_payload(20.0));
        h.fetcher.delay("SLOW", Duration::from_secs(5));
        h.state.lifecycle.start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        h.state.lifecycle.shutdown().await;

        assert_eq!(h.dispatcher.sent_for("SLOW").len(), 1);
        assert!(!h.state.lifecycle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_status() {
        let h = harness();

        let stopped = h.state.lifecycle.status();
        h.state.lifecycle.start();
        let running = h.state.lifecycle.status();

        assert_eq!(
            stopped,
            MonitoringStatus {
                running: false,
                tick_interval_secs: 10
            }
        );
        assert!(running.running);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_polling_healthy_devices_while_one_fetch_hangs() {
        // Arrange
        let store = Arc::new(InMemoryThermometerStore::new());
        let fetcher = ScriptedFetcher::new();
        let dispatcher = RecordingDispatcher::new();
        let state = assemble(
            store.clone(),
            fetcher.clone(),
            dispatcher.clone(),
            TokioClock::new(),
            MonitoringOptions {
                tick_interval: TICK,
                call_timeout: Duration::from_secs(5),
                ..MonitoringOptions::default()
            },
        );
        store.insert(device("HUNG", "C1", 10)).await.unwrap();
        store.insert(device("OK", "C1", 10)).await.unwrap();
        fetcher.hang("HUNG");
        fetcher.answer("OK", temperature_payload(20.0));

        // Act
        state.lifecycle.start();
        tokio::time::sleep(Duration::from_secs(3600)).await;

        // Assert
        assert_eq!(state.lifecycle.state(), LifecycleState::Running);
        assert!(fetcher.calls_for("OK") >= 300);
        assert!(dispatcher.sent_for("OK").len() >= 300);
        assert!(dispatcher.sent_for("HUNG").is_empty());
    }
}

mod registration_events {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn should_run_while_a_device_is_registered() {
        // Arrange
        let h = harness();
        h.fetcher.answer("T1", temperature_payload(20.0));

        // Act
        h.state
            .thermometer_service
            .register(register("T1", "C1"))
            .await
            .unwrap();
        let after_register = h.state.lifecycle.state();
        tokio::time::sleep(Duration::from_millis(1)).await;
        h.state
            .thermometer_service
            .unregister("T1", "C1")
            .await
            .unwrap();

        // Assert
        assert_eq!(after_register, LifecycleState::Running);
        assert_eq!(h.state.lifecycle.state(), LifecycleState::Stopped);
        assert_eq!(h.dispatcher.sent_for("T1").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_running_while_other_devices_remain() {
        let h = harness();
        let service = &h.state.thermometer_service;
        service.register(register("T1", "C1")).await.unwrap();
        service.register(register("T2", "C2")).await.unwrap();

        service.unregister("T1", "C1").await.unwrap();

        assert!(h.state.lifecycle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_single_loop_when_registering_repeatedly() {
        // Arrange
        let h = harness();
        let service = &h.state.thermometer_service;
        h.fetcher.answer("T1", temperature_payload(20.0));
        h.fetcher.answer("T2", temperature_payload(20.0));

        // Act
        service.register(register("T1", "C1")).await.unwrap();
        service.register(register("T2", "C1")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;

        // Assert
        assert!(h.state.lifecycle.is_running());
        assert_eq!(h.fetcher.calls_for("T1"), 3);
        assert_eq!(h.fetcher.calls_for("T2"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_resume_when_registry_has_active_devices() {
        let h = harness();
        h.store.insert(device("T1", "C1", 10)).await.unwrap();

        let resumed = h.state.lifecycle.resume_if_active().await.unwrap();

        assert!(resumed);
        assert!(h.state.lifecycle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn should_stay_idle_when_registry_is_empty() {
        let h = harness();

        let resumed = h.state.lifecycle.resume_if_active().await.unwrap();

        assert!(!resumed);
        assert_eq!(h.state.lifecycle.state(), LifecycleState::Stopped);
    }
}
