//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation generation.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Adaptive
        crate::routes::adaptive::post_adaptive,
        crate::routes::adaptive::list_profiles,
        // Contact
        crate::routes::contact::submit_contact,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::routes::adaptive::AdaptiveRequest,
        crate::routes::adaptive::AdaptiveResponse,
        crate::routes::adaptive::AdaptiveMode,
        crate::routes::adaptive::RecommendationView,
        crate::routes::adaptive::ProfilesResponse,
        crate::routes::adaptive::CompanyView,
        crate::routes::adaptive::PersonaView,
        crate::routes::contact::ContactResponse,
        crate::services::contact_service::ContactRequest,
        crate::services::ai_service::NarrativeSource,
        crate::services::ai_service::AiProvider,
        crate::models::AssetKind,
        crate::models::ThemeTokens,
    )),
    tags(
        (name = "Adaptive", description = "Company and persona tailored recommendations"),
        (name = "Contact", description = "Contact form submissions"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    // Version comes from Cargo.toml
    info(
        title = "Portfolio Adaptive API",
        description = "Personalized portfolio recommendations with optional AI narratives",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8081", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_public_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/adaptive",
            "/api/adaptive/profiles",
            "/api/contact",
            "/api/openapi.json",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
    }
}
