use std::net::SocketAddr;
use std::sync::Arc;

use thermo_watch::config::{establish_connection, AppConfig};
use thermo_watch::domain::thermometer::{
    InMemoryThermometerStore, SeaOrmThermometerStore, ThresholdPolicy,
};
use thermo_watch::monitoring::{SlackAlert, SystemClock, TuyaClient};
use thermo_watch::shutdown::shutdown_signal;
use thermo_watch::utils::logging::init_logging;
use thermo_watch::{app, assemble, AppState, MonitoringOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment
    dotenvy::dotenv().ok();

    // 2. Logging (guard must outlive the server)
    let _log_guard = init_logging();

    // 3. Configuration
    let config = AppConfig::from_env()?;

    // 4. Collaborators
    let fetcher = Arc::new(TuyaClient::new(config.tuya.clone()).with_timeout(config.call_timeout));
    let dispatcher = Arc::new(
        SlackAlert::from_token(config.slack_bot_token.clone()).with_timeout(config.call_timeout),
    );
    if !dispatcher.is_enabled() {
        tracing::warn!("SLACK_BOT_TOKEN is not set; temperature alerts are disabled.");
    }
    let options = MonitoringOptions {
        tick_interval: config.tick_interval,
        max_concurrency: config.max_concurrency,
        call_timeout: config.call_timeout,
        policy: ThresholdPolicy::default().with_min_interval(config.min_interval_secs),
    };

    // 5. Registry + monitoring
    let state: AppState = match config.database_url.as_deref() {
        Some(url) => {
            let db = establish_connection(url).await?;
            assemble(
                Arc::new(SeaOrmThermometerStore::new(db)),
                fetcher,
                dispatcher,
                Arc::new(SystemClock),
                options,
            )
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; registrations are kept in memory only.");
            assemble(
                Arc::new(InMemoryThermometerStore::new()),
                fetcher,
                dispatcher,
                Arc::new(SystemClock),
                options,
            )
        }
    };

    match state.lifecycle.resume_if_active().await {
        Ok(true) => tracing::info!("Active thermometers found; monitoring resumed"),
        Ok(false) => tracing::info!("No active thermometers; monitoring idle"),
        Err(e) => tracing::error!(error = %e, "Could not read registry on startup"),
    }

    // 6. Server
    let lifecycle = state.lifecycle.clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    lifecycle.shutdown().await;
    tracing::info!("Monitoring stopped; bye");
    Ok(())
}
