//! Error types shared across the gateway.
//!
//! `GatewayError` is the single error type returned by provider adapters,
//! the resilience layer, and the admission pipeline. Each variant maps to
//! exactly one HTTP status family so `gateway-server::error` can translate
//! it without re-deriving the taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias used throughout the gateway crates.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors produced anywhere in the request path.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Missing or invalid credential.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Human-readable reason, never echoes the credential.
        message: String,
    },

    /// Field-level validation failure on a request value.
    #[error("validation failed: {message}")]
    Validation {
        /// Human-readable reason.
        message: String,
        /// The offending field, when known.
        field: Option<String>,
        /// Stable machine-readable code.
        code: String,
    },

    /// Rate limit window exceeded.
    #[error("rate limit exceeded")]
    RateLimit {
        /// Seconds until the window resets, when known.
        retry_after: Option<Duration>,
        /// The ceiling that was exceeded, when known.
        limit: Option<u32>,
    },

    /// Policy engine denial.
    #[error("denied by policy: {reason}")]
    PolicyDenied {
        /// Terse, operator-safe reason surfaced to the caller.
        reason: String,
    },

    /// Upstream provider returned an error or could not be reached.
    #[error("provider {provider} error: {message}")]
    Provider {
        /// Adapter/provider id that produced the error.
        provider: String,
        /// Human-readable message.
        message: String,
        /// Upstream HTTP status, when the upstream responded.
        status_code: Option<u16>,
        /// Whether a retry is likely to succeed.
        retryable: bool,
    },

    /// Requested model is unknown to any configured provider.
    #[error("model not found: {message}")]
    ModelNotFound {
        /// Human-readable message.
        message: String,
    },

    /// A call exceeded its deadline.
    #[error("operation timed out after {elapsed:?}")]
    Timeout {
        /// How long the gateway waited before giving up.
        elapsed: Duration,
    },

    /// Circuit breaker is open for a provider.
    #[error("circuit breaker open for provider {provider}")]
    CircuitBreakerOpen {
        /// Provider id whose breaker tripped.
        provider: String,
    },

    /// Streaming transport failure.
    #[error("streaming error: {message}")]
    Streaming {
        /// Human-readable message.
        message: String,
    },

    /// Static or dynamic configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable message.
        message: String,
    },

    /// Cache, database, or event-stream unavailability that should degrade
    /// gracefully rather than fail the request.
    #[error("transient infrastructure error: {message}")]
    TransientInfra {
        /// Human-readable message.
        message: String,
    },

    /// Bug or invariant violation; carries a stable id for correlation.
    #[error("internal error ({error_id}): {message}")]
    Internal {
        /// Message safe to log, not necessarily safe to show the caller.
        message: String,
        /// Stable id surfaced to the caller instead of the message.
        error_id: String,
    },
}

impl GatewayError {
    /// Build a [`GatewayError::Authentication`] error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Build a [`GatewayError::Validation`] error.
    #[must_use]
    pub fn validation(
        message: impl Into<String>,
        field: impl Into<Option<String>>,
        code: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.into(),
            code: code.into(),
        }
    }

    /// Build a [`GatewayError::RateLimit`] error.
    #[must_use]
    pub const fn rate_limit(retry_after: Option<Duration>, limit: Option<u32>) -> Self {
        Self::RateLimit { retry_after, limit }
    }

    /// Build a [`GatewayError::PolicyDenied`] error.
    #[must_use]
    pub fn policy_denied(reason: impl Into<String>) -> Self {
        Self::PolicyDenied {
            reason: reason.into(),
        }
    }

    /// Build a [`GatewayError::Provider`] error.
    #[must_use]
    pub fn provider(
        provider: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
        retryable: bool,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status_code,
            retryable,
        }
    }

    /// Build a [`GatewayError::ModelNotFound`] error.
    #[must_use]
    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::ModelNotFound {
            message: message.into(),
        }
    }

    /// Build a [`GatewayError::Streaming`] error.
    #[must_use]
    pub fn streaming(message: impl Into<String>) -> Self {
        Self::Streaming {
            message: message.into(),
        }
    }

    /// Build a [`GatewayError::CircuitBreakerOpen`] error.
    #[must_use]
    pub fn circuit_breaker_open(provider: impl Into<String>) -> Self {
        Self::CircuitBreakerOpen {
            provider: provider.into(),
        }
    }

    /// Build a [`GatewayError::TransientInfra`] error.
    #[must_use]
    pub fn transient_infra(message: impl Into<String>) -> Self {
        Self::TransientInfra {
            message: message.into(),
        }
    }

    /// Build a [`GatewayError::Internal`] error with a fresh correlation id.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            error_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Whether retrying the same call is expected to help.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { retryable, .. } => *retryable,
            Self::Timeout { .. } | Self::RateLimit { .. } | Self::Streaming { .. } => true,
            _ => false,
        }
    }

    /// The error-taxonomy kind this variant belongs to, per the gateway's
    /// error handling design (auth / rate / policy / upstream /
    /// transient-infra / internal).
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "auth",
            Self::RateLimit { .. } => "rate",
            Self::PolicyDenied { .. } => "policy",
            Self::Provider { .. } | Self::ModelNotFound { .. } | Self::Streaming { .. } => {
                "upstream"
            }
            Self::Timeout { .. } => "upstream",
            Self::CircuitBreakerOpen { .. } | Self::TransientInfra { .. } => "transient-infra",
            Self::Validation { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "internal"
            }
        }
    }
}
