//! Structured logging bootstrap.
//!
//! Separate from [`crate::tracing_setup`]: this installs the
//! `tracing_subscriber` fmt layer that writes structured log lines to
//! stdout, while [`crate::tracing_setup::init_tracing`] additionally wires
//! an OpenTelemetry exporter. Call [`init_logging`] when OTLP export isn't
//! configured.

use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level filter, used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit one JSON object per line instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Start from the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default level filter.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Switch to JSON-formatted log lines.
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Install the global `tracing` subscriber.
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    if config.json {
        subscriber.json().try_init()?;
    } else {
        subscriber.try_init()?;
    }

    Ok(())
}
