//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick pretty or JSON output from configuration
//! - Let `RUST_LOG` override the configured level

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the level filter: `RUST_LOG` first, then the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .try_init()
}
