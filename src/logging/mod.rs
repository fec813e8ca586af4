// Logging module for structured logging using the tracing crate

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};

/// Logging error types
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    #[error("Failed to initialize logging: {0}")]
    InitError(String),
}

/// Build the event filter. `RUST_LOG` takes precedence over the configured
/// level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidFilter {
        directive: config.level.clone(),
        message: e.to_string(),
    })
}

/// Initialize the tracing subscriber for structured logging
///
/// Events go to stderr so exported data and CLI output on stdout stay
/// clean. JSON output suits log aggregation; pretty output suits terminals.
///
/// # Examples
///
/// ```ignore
/// use tilemark::config::LoggingConfig;
/// use tilemark::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default())?;
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;

    let result = match config.format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| LoggingError::InitError(e.to_string()))
}
