//! Configuration loading errors.

use thiserror::Error;

/// Errors produced while loading or parsing [`crate::GatewayConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file couldn't be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file's extension wasn't `.toml` or `.yaml`/`.yml`.
    #[error("unrecognized config file extension: {path}")]
    UnknownFormat {
        /// Offending path.
        path: String,
    },

    /// TOML parsing failed.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing failed.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A required value was present but could not be parsed (e.g. a
    /// non-numeric port).
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the offending field or environment variable.
        field: String,
        /// Human-readable parse failure.
        message: String,
    },

    /// Struct-level validation failed after loading.
    #[error("config validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
