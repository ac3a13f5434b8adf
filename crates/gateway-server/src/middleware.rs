//! Cross-cutting request middleware: request ids, timing, logging, and
//! security headers, applied to every route ahead of the handlers.

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Ensure every request carries an `x-request-id`, generating one if the
/// caller didn't send it.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let has_id = req.headers().contains_key("x-request-id");
    if !has_id {
        if let Ok(value) = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()) {
            req.headers_mut().insert("x-request-id", value);
        }
    }
    next.run(req).await
}

/// Stamp the response with its total handling time, in milliseconds.
pub async fn response_time_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    if let Ok(value) = HeaderValue::from_str(&elapsed.as_millis().to_string()) {
        response.headers_mut().insert("x-response-time-ms", value);
    }
    response
}

/// Log method, path, and outcome for every request at `info`.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    info!(%method, %path, status = %response.status(), "handled request");
    response
}

/// A conservative baseline security header set; the gateway sits behind
/// operator-controlled ingress, so this is a floor, not a full policy.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("no-referrer"),
    );
    response
}

/// Permissive CORS for the inference API; tightened at the ingress layer
/// when an operator needs to restrict origins.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Convert any panic caught by `tower_http::catch_panic` into a 500
/// instead of tearing down the connection.
#[must_use]
pub fn panic_response() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

use axum::response::IntoResponse;
