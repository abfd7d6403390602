//! Structured logging setup
//!
//! JSON lines to stdout plus a daily rolling file under `LOG_DIR`.

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_FILTER: &str = "info,thermo_watch=debug";
const LOG_FILE_PREFIX: &str = "thermo-watch.log";

/// Initialise the global subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. `LOG_FORMAT=pretty` switches stdout
/// to human-readable output; the file layer always writes JSON
/// (`thermo-watch.log.YYYY-MM-DD`).
///
/// Keep the returned guard alive for the whole process or buffered lines are lost.
pub fn init_logging() -> WorkerGuard {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("pretty"));

    let (non_blocking, guard) = tracing_appender::non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let stdout_layer = if pretty {
        fmt::layer()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .json()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_current_span(true)
            .flatten_event(false)
            .boxed()
    };

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_current_span(true)
        .flatten_event(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber installed earlier (tests) wins; anything else is reported.
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
    {
        use std::error::Error;
        let already_set = err
            .source()
            .and_then(|s| s.downcast_ref::<tracing::dispatcher::SetGlobalDefaultError>())
            .is_some();
        if !already_set {
            eprintln!("Failed to initialize tracing: {}", err);
        }
    }

    guard
}
