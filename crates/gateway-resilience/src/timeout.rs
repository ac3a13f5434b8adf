//! Per-call wall-clock timeout enforcement.
//!
//! Distinct from a provider's own [`gateway_core::LLMProvider::timeout`]:
//! that is the HTTP client timeout on a single upstream call, this wraps
//! an arbitrary future (including the retry loop around several upstream
//! calls) with one deadline.

use gateway_core::GatewayError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Timeout configuration for a named operation.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Wall-clock deadline for the wrapped future.
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    /// Build a config with an explicit deadline.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

/// Applies a [`TimeoutConfig`] to arbitrary futures, tagging the resulting
/// error with the operation name that timed out.
#[derive(Debug, Clone)]
pub struct TimeoutManager {
    config: TimeoutConfig,
}

impl TimeoutManager {
    /// Build a manager with the given deadline.
    #[must_use]
    pub const fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// Build a manager with the default 30s deadline.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(TimeoutConfig::default())
    }

    /// Run `fut` under this manager's deadline.
    ///
    /// # Errors
    /// Returns [`GatewayError::Timeout`] if `fut` does not resolve in time.
    pub async fn run<F, T>(&self, operation: &str, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = T>,
    {
        match tokio::time::timeout(self.config.duration, fut).await {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(operation, deadline_ms = self.config.duration.as_millis(), "operation timed out");
                Err(GatewayError::Timeout {
                    elapsed: self.config.duration,
                })
            }
        }
    }
}
