//! CORS middleware configuration.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::request_context::{
    X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET, X_REQUEST_ID,
};

/// Create the CORS layer for the API.
///
/// With no configured origins every origin is allowed (local development).
/// Otherwise only the listed origins are; unparseable entries are skipped.
/// Rate-limit and request-id headers are exposed to browser clients either
/// way.
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let exposed: [HeaderName; 5] = [
        X_RATELIMIT_LIMIT,
        X_RATELIMIT_REMAINING,
        X_RATELIMIT_RESET,
        header::RETRY_AFTER,
        X_REQUEST_ID,
    ];

    if allowed_origins.is_empty() {
        return CorsLayer::permissive().expose_headers(exposed);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| tracing::warn!("Ignoring invalid CORS origin: {}", origin))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, X_REQUEST_ID])
        .expose_headers(exposed)
}
