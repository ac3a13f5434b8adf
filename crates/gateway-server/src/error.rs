//! HTTP-facing error type: translates [`GatewayError`] and handler-local
//! failures into the status codes and terse bodies the error handling
//! design calls for.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::GatewayError;
use serde::Serialize;

/// An error ready to be written to the HTTP response.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Status code to send.
    pub status: StatusCode,
    /// Terse, operator-safe message shown to the caller.
    pub message: String,
    /// Seconds to wait before retrying, set only for 429 responses.
    pub retry_after: Option<u64>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    /// Build a 401.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Build a 400.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Build a 404.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Build a 403 policy denial.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Build a 429 with a `Retry-After` value.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: message.into(),
            retry_after: Some(retry_after_secs),
        }
    }

    /// Build a 503.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Build a 500.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            retry_after: None,
        }
    }
}

/// Map the error taxonomy in [`GatewayError::kind`] onto a status family;
/// policy denials and internal errors carry their own terse message,
/// everything else is deliberately generic to avoid leaking configuration.
impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Authentication { .. } => Self::unauthorized("invalid credential"),
            GatewayError::RateLimit { retry_after, limit: _ } => Self::rate_limited(
                "rate limit exceeded",
                retry_after.map_or(60, |d| d.as_secs()),
            ),
            GatewayError::PolicyDenied { reason } => Self::forbidden(reason),
            GatewayError::ModelNotFound { message } => Self::not_found(message),
            GatewayError::Provider { status_code, message, .. } => Self {
                status: status_code
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                message,
                retry_after: None,
            },
            GatewayError::Timeout { .. } => Self::service_unavailable("upstream timed out"),
            GatewayError::CircuitBreakerOpen { .. } => {
                Self::service_unavailable("provider temporarily unavailable")
            }
            GatewayError::Streaming { message } => Self::internal(message),
            GatewayError::TransientInfra { .. } => {
                Self::service_unavailable("temporarily unavailable")
            }
            GatewayError::Validation { message, .. } => Self::bad_request(message),
            GatewayError::Configuration { .. } | GatewayError::Internal { .. } => {
                Self::internal("internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            Json(ErrorBody { error: &self.message }),
        )
            .into_response();

        if let Some(secs) = self.retry_after {
            if let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}
