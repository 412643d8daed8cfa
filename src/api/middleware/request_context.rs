//! Per-request API context: client IP, request id, rate-limit decision and
//! the response headers that go with it.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::client_ip::resolve_client_ip;
use super::rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter, rate_limit_key};
use super::request_id::{
    MAX_REQUEST_ID_LEN, RequestIdGenerator, normalize_request_id, normalize_request_id_header,
};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Everything a rate-limited handler needs to know about the caller.
#[derive(Debug, Clone)]
pub struct ApiRequestContext {
    pub request_id: Option<String>,
    pub ip: String,
    pub rate_limit_key: String,
    pub rate_limit: RateLimitResult,
    /// Headers for any response that is not a rate-limit rejection.
    pub response_headers: HeaderMap,
    /// Headers for a 429 response; adds `Retry-After`.
    pub exceeded_headers: HeaderMap,
}

impl ApiRequestContext {
    pub fn is_allowed(&self) -> bool {
        self.rate_limit.success
    }
}

/// Resolve the caller, consult the limiter and build both header sets.
///
/// An incoming `X-Request-Id` is reused when it survives normalization;
/// otherwise a fresh id is generated.
pub fn build_api_request_context(
    headers: &HeaderMap,
    limiter: &RateLimiter,
    request_ids: &RequestIdGenerator,
    rate_limit_namespace: &str,
    rate_limit_config: RateLimitConfig,
) -> ApiRequestContext {
    let request_id = headers
        .get(&X_REQUEST_ID)
        .and_then(normalize_request_id_header)
        .or_else(|| normalize_request_id(&request_ids.generate(), MAX_REQUEST_ID_LEN));

    let ip = resolve_client_ip(headers);
    let key = rate_limit_key(rate_limit_namespace, &ip);
    let rate_limit = limiter.check(&key, rate_limit_config);

    let (response_headers, exceeded_headers) =
        rate_limit_headers(&rate_limit, rate_limit_config, request_id.as_deref());

    ApiRequestContext {
        request_id,
        ip,
        rate_limit_key: key,
        rate_limit,
        response_headers,
        exceeded_headers,
    }
}

/// Build the normal and the exceeded header sets for a limiter result.
///
/// `X-RateLimit-Remaining` is clamped to `[0, limit]`. `X-RateLimit-Reset` is
/// whole seconds rounded up; on the exceeded path it and `Retry-After` are
/// at least 1.
pub fn rate_limit_headers(
    result: &RateLimitResult,
    config: RateLimitConfig,
    request_id: Option<&str>,
) -> (HeaderMap, HeaderMap) {
    let limit = config.max_requests();
    let remaining = result.remaining.min(limit);
    let reset_secs = result.reset_in_ms.div_ceil(1000);
    let retry_after = reset_secs.max(1);

    let mut response_headers = HeaderMap::new();
    response_headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    response_headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    response_headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_secs));
    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        response_headers.insert(X_REQUEST_ID, value);
    }

    let mut exceeded_headers = response_headers.clone();
    exceeded_headers.insert(X_RATELIMIT_RESET, HeaderValue::from(retry_after));
    exceeded_headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));

    (response_headers, exceeded_headers)
}
