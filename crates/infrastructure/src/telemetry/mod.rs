//! Logging setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` wins over the
//! built-in filter when set.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "api_server=debug,presentation_http=debug,tower_http=debug";

/// Telemetry initialization errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Subscriber could not be installed (usually: already installed)
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Install the global tracing subscriber
pub fn init_tracing(format: LogFormat) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))
}
