//! Structured logging setup.
//!
//! Environment-aware `tracing` initialization with console output and an
//! optional JSON format for log aggregation.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// The filter comes from `TASKQUEUE_LOG` when set, otherwise from the
/// environment-specific default level. `TASKQUEUE_LOG_FORMAT=json` switches
/// the output to JSON lines.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let filter =
            EnvFilter::try_from_env("TASKQUEUE_LOG").unwrap_or_else(|_| EnvFilter::new(log_level));

        let json_output = std::env::var("TASKQUEUE_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let registry = tracing_subscriber::registry().with(filter);
        let initialized = if json_output {
            registry
                .with(fmt::layer().json().with_target(true))
                .try_init()
        } else {
            registry.with(fmt::layer().with_target(true)).try_init()
        };

        // A subscriber may already be installed by an embedding process or
        // a test harness; that is not an error.
        if initialized.is_err() {
            tracing::debug!("global tracing subscriber already initialized");
            return;
        }

        tracing::info!(
            environment = %environment,
            json_output = json_output,
            "structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("TASKQUEUE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
