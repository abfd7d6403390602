pub mod config;
pub mod domain;
pub mod monitoring;
pub mod shutdown;
pub mod state;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use domain::thermometer::{ThermometerService, ThermometerStore, ThresholdPolicy};
use monitoring::{AlertDispatcher, Clock, DeviceStatusFetcher, LifecycleController, MonitoringEngine};
pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        domain::thermometer::handler::register_thermometer,
        domain::thermometer::handler::unregister_thermometer,
        domain::thermometer::handler::list_channel_thermometers,
        domain::thermometer::handler::monitoring_status,
    ),
    components(
        schemas(
            domain::thermometer::dto::RegisterThermometerRequest,
            domain::thermometer::dto::ThermometerResponse,
            domain::thermometer::dto::SuccessThermometerResponse,
            domain::thermometer::dto::SuccessThermometerListResponse,
            domain::thermometer::dto::SuccessMonitoringStatusResponse,
            monitoring::MonitoringStatus,
            utils::response::ErrorResponse,
        )
    ),
    tags(
        (name = "Thermometer", description = "Thermometer registration"),
        (name = "Monitoring", description = "Monitoring loop diagnostics")
    )
)]
pub struct ApiDoc;

/// Runtime knobs for [`assemble`]
#[derive(Debug, Clone)]
pub struct MonitoringOptions {
    pub tick_interval: Duration,
    pub max_concurrency: usize,
    pub call_timeout: Duration,
    pub policy: ThresholdPolicy,
}

impl Default for MonitoringOptions {
    fn default() -> Self {
        Self {
            tick_interval: monitoring::lifecycle::DEFAULT_TICK_INTERVAL,
            max_concurrency: monitoring::engine::DEFAULT_MAX_CONCURRENCY,
            call_timeout: monitoring::engine::DEFAULT_CALL_TIMEOUT,
            policy: ThresholdPolicy::default(),
        }
    }
}

/// Wire a store and collaborators into the engine, lifecycle and service
///
/// The same store backs registrations and the engine's registry view.
pub fn assemble<S>(
    store: Arc<S>,
    fetcher: Arc<dyn DeviceStatusFetcher>,
    dispatcher: Arc<dyn AlertDispatcher>,
    clock: Arc<dyn Clock>,
    options: MonitoringOptions,
) -> AppState
where
    S: ThermometerStore + 'static,
{
    let engine = Arc::new(
        MonitoringEngine::new(store.clone(), fetcher, dispatcher, clock.clone())
            .with_max_concurrency(options.max_concurrency)
            .with_call_timeout(options.call_timeout),
    );
    let lifecycle = Arc::new(LifecycleController::new(
        engine,
        store.clone(),
        options.tick_interval,
    ));
    let thermometer_service = Arc::new(ThermometerService::new(
        store,
        lifecycle.clone(),
        options.policy,
        clock,
    ));

    AppState {
        thermometer_service,
        lifecycle,
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "OK" }))
        .route(
            "/api/thermometers",
            post(domain::thermometer::handler::register_thermometer),
        )
        .route(
            "/api/thermometers/:thermometer_id",
            delete(domain::thermometer::handler::unregister_thermometer),
        )
        .route(
            "/api/channels/:channel_id/thermometers",
            get(domain::thermometer::handler::list_channel_thermometers),
        )
        .route(
            "/api/monitoring/status",
            get(domain::thermometer::handler::monitoring_status),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
