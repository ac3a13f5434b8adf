//! Validated newtypes used across request/response types.
//!
//! Each numeric newtype enforces its valid range at construction time so
//! downstream code never re-checks bounds it already holds evidence for.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error produced by a newtype constructor before it has a `GatewayError`
/// to report to (the crate's error type lives one level up and already
/// depends on this module, so constructors return this local error and
/// convert at the call site).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    field: &'static str,
    message: String,
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::validation(err.message, Some(err.field.to_string()), "out_of_range")
    }
}

macro_rules! bounded_float_newtype {
    ($name:ident, $field:literal, $min:expr, $max:expr) => {
        #[doc = concat!("Validated ", $field, ", always within range.")]
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        pub struct $name(f32);

        impl $name {
            #[doc = concat!("Construct a validated ", $field, ".")]
            ///
            /// # Errors
            /// Returns an error if the value is outside the accepted range.
            pub fn new(value: f32) -> Result<Self, ValidationError> {
                if (($min)..=($max)).contains(&value) {
                    Ok(Self(value))
                } else {
                    Err(ValidationError {
                        field: $field,
                        message: format!(
                            "{} must be between {} and {}, got {value}",
                            $field, $min, $max
                        ),
                    })
                }
            }

            /// The underlying value.
            #[must_use]
            pub const fn value(self) -> f32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

bounded_float_newtype!(Temperature, "temperature", 0.0, 2.0);
bounded_float_newtype!(TopP, "top_p", 0.0, 1.0);

/// Validated `top_k`, a positive sampling cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopK(u32);

impl TopK {
    /// Construct a validated `top_k`.
    ///
    /// # Errors
    /// Returns an error if the value is zero.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                field: "top_k",
                message: "top_k must be greater than zero".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// The underlying value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Validated `max_tokens`, bounded to a sane upper limit shared by every
/// supported provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxTokens(u32);

impl MaxTokens {
    /// Provider-agnostic ceiling; individual adapters may clamp further.
    pub const MAX: u32 = 128_000;

    /// Construct a validated `max_tokens`.
    ///
    /// # Errors
    /// Returns an error if the value is zero or exceeds [`MaxTokens::MAX`].
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 || value > Self::MAX {
            return Err(ValidationError {
                field: "max_tokens",
                message: format!("max_tokens must be in 1..={}, got {value}", Self::MAX),
            });
        }
        Ok(Self(value))
    }

    /// The underlying value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Canonical model identifier (e.g. `gpt-4o`, `claude-3-5-sonnet-latest`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(String);

impl ModelId {
    /// Construct a validated model id.
    ///
    /// # Errors
    /// Returns an error if the value is empty or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError {
                field: "model",
                message: "model id must not be empty".to_string(),
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError {
                field: "model",
                message: "model id must not contain whitespace".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque upstream provider identifier (`openai`, `anthropic`, `google`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(String);

impl ProviderId {
    /// Wrap a provider id string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique per-request identifier, generated when the caller omits one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh request id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}
