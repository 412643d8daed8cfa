// Middleware module - rate limiting, request identity and per-request context

pub mod client_ip;
pub mod cors;
pub mod observability;
pub mod rate_limit;
pub mod request_context;
pub mod request_id;

// Re-export for convenience
pub use cors::create_cors_layer;
pub use rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
pub use request_context::{ApiRequestContext, build_api_request_context};
pub use request_id::{RequestIdGenerator, create_request_id, normalize_request_id};
