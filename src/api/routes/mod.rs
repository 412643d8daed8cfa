//! API routes module - organizes all route handlers.
//!
//! Every endpoint lives under `/api`; `/health` sits at the root.

pub mod adaptive;
pub mod app_state;
pub mod contact;
pub mod error;
pub mod openapi;

use axum::{Router, response::Json, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use app_state::AppState;

use crate::middleware::create_cors_layer;

/// Create the API router combining all route modules.
///
/// State is applied by [`create_app`]; tests that need a custom state call
/// that with their own [`AppState`].
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(adaptive::adaptive_router())
        .merge(contact::contact_router())
        // OpenAPI documentation endpoint
        .merge(openapi::openapi_router())
}

/// Build the complete application: health check, `/api` routes, state and
/// middleware layers.
pub fn create_app(app_state: AppState) -> Router {
    let cors = create_cors_layer(&app_state.config.cors_allowed_origins);

    // Apply with_state FIRST so the router is Router<()> before layering
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_api_router())
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
