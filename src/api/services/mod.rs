//! Services module - contains the catalog, recommendation engine, AI enrichment and contact form logic.

pub mod ai_service;
pub mod catalog;
pub mod contact_service;
pub mod recommendation_service;

// Re-export for convenience
pub use ai_service::{AiProvider, EnrichmentService, NarrativeSource, TextGenerator};
pub use catalog::Catalog;
pub use contact_service::{ContactError, ContactSubmission};
pub use recommendation_service::RecommendationService;
