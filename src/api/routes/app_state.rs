//! Application state management.
//!
//! Defines the AppState struct that holds the resolved configuration, the
//! rate-limit store, the request id generator and the recommendation and
//! enrichment services.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::AppConfig;
use crate::middleware::{RateLimiter, RequestIdGenerator};
use crate::services::{Catalog, EnrichmentService, RecommendationService};

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration resolved at startup
    pub config: Arc<AppConfig>,
    /// In-memory fixed-window rate limiter (resets on restart)
    pub rate_limiter: Arc<RateLimiter>,
    /// Request id generator
    pub request_ids: Arc<RequestIdGenerator>,
    /// Recommendation engine over the static catalog
    pub recommendations: Arc<RecommendationService>,
    /// Optional AI narrative enrichment
    pub enrichment: Arc<EnrichmentService>,
}

impl AppState {
    /// Create application state for a configuration with the built-in catalog.
    pub fn new(config: AppConfig) -> Self {
        let enrichment = EnrichmentService::from_config(&config);
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::new()),
            request_ids: Arc::new(RequestIdGenerator::new()),
            recommendations: Arc::new(RecommendationService::new(Arc::new(Catalog::builtin()))),
            enrichment: Arc::new(enrichment),
        }
    }

    /// Serve recommendations from a different catalog.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.recommendations = Arc::new(RecommendationService::new(Arc::new(catalog)));
        self
    }

    /// Replace the enrichment service (used to inject stub generators).
    pub fn with_enrichment(mut self, enrichment: EnrichmentService) -> Self {
        self.enrichment = Arc::new(enrichment);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// Allow handlers to extract individual services from AppState
impl FromRef<AppState> for Arc<RecommendationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.recommendations.clone()
    }
}
