//! Adaptive personalization routes.
//!
//! `POST /api/adaptive` runs: rate check -> body validation -> deterministic
//! bundle -> optional AI enrichment -> response. Only the first three steps
//! can fail visibly (429/400/404).

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::error::{AdaptiveError, ApiError};
use crate::middleware::build_api_request_context;
use crate::models::{AssetKind, Recommendation, RecommendationBundle, ThemeTokens};
use crate::services::ai_service::{AiProvider, NarrativeOutcome, NarrativeSource};
use crate::services::recommendation_service::{RecommendationService, visitor_narrative};

/// Rate-limit bucket namespace for this endpoint.
pub const ADAPTIVE_NAMESPACE: &str = "adaptive";

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveRequest {
    pub company_id: Option<String>,
    pub persona_id: Option<String>,
    /// `openai` or `anthropic`; unknown values are ignored
    pub provider: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveMode {
    pub company_id: String,
    pub persona_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
    pub title: String,
    pub url: String,
    pub kind: AssetKind,
    pub reason: String,
    pub matched_tags: Vec<String>,
}

impl From<&Recommendation> for RecommendationView {
    fn from(recommendation: &Recommendation) -> Self {
        Self {
            title: recommendation.asset.title.clone(),
            url: recommendation.asset.url.clone(),
            kind: recommendation.asset.kind,
            reason: recommendation.reason.clone(),
            matched_tags: recommendation.matched_tags.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveResponse {
    pub mode: AdaptiveMode,
    pub company_name: String,
    pub persona_name: String,
    pub persona_role: String,
    pub deterministic_narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_narrative: Option<String>,
    pub narrative_source: NarrativeSource,
    pub recommendations: Vec<RecommendationView>,
    pub supporting_recommendations: Vec<RecommendationView>,
    pub highlights: Vec<String>,
}

impl AdaptiveResponse {
    fn new(bundle: &RecommendationBundle, narrative: NarrativeOutcome) -> Self {
        Self {
            mode: AdaptiveMode {
                company_id: bundle.company.id.clone(),
                persona_id: bundle.persona.id.clone(),
            },
            company_name: bundle.company.name.clone(),
            persona_name: bundle.persona.name.clone(),
            persona_role: bundle.persona.role.clone(),
            deterministic_narrative: narrative.deterministic,
            ai_narrative: narrative.ai,
            narrative_source: narrative.source,
            recommendations: bundle.top_recommendations.iter().map(Into::into).collect(),
            supporting_recommendations: bundle
                .supporting_recommendations
                .iter()
                .map(Into::into)
                .collect(),
            highlights: bundle.highlights.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonaView {
    pub id: String,
    pub name: String,
    pub role: String,
    pub recommendation_goal: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub theme: ThemeTokens,
    pub default_persona_id: String,
    pub personas: Vec<PersonaView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesResponse {
    pub companies: Vec<CompanyView>,
}

/// Create the adaptive router
pub fn adaptive_router() -> Router<AppState> {
    Router::new()
        .route("/adaptive", post(post_adaptive))
        .route("/adaptive/profiles", get(list_profiles))
}

/// POST /api/adaptive - Personalized recommendations for a company/persona pair
#[utoipa::path(
    post,
    path = "/api/adaptive",
    tag = "Adaptive",
    request_body = AdaptiveRequest,
    responses(
        (status = 200, description = "Recommendation bundle with narrative", body = AdaptiveResponse),
        (status = 400, description = "Invalid JSON or unknown company/persona"),
        (status = 404, description = "No recommendations for this combination"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn post_adaptive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = build_api_request_context(
        &headers,
        &state.rate_limiter,
        &state.request_ids,
        ADAPTIVE_NAMESPACE,
        state.config.adaptive_rate_limit,
    );

    if !ctx.is_allowed() {
        warn!(
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            key = %ctx.rate_limit_key,
            "Rate limit exceeded for /api/adaptive"
        );
        return ApiError::too_many_requests().with_headers(ctx.exceeded_headers);
    }

    match adapt(&state, &body, ctx.request_id.as_deref()).await {
        Ok(response) => {
            info!(
                request_id = ctx.request_id.as_deref().unwrap_or("-"),
                company = %response.mode.company_id,
                persona = %response.mode.persona_id,
                source = ?response.narrative_source,
                "Adaptive bundle served"
            );
            (ctx.response_headers, Json(response)).into_response()
        }
        Err(err) => {
            info!(
                request_id = ctx.request_id.as_deref().unwrap_or("-"),
                "Adaptive request rejected: {}", err
            );
            ApiError::from(err).with_headers(ctx.response_headers)
        }
    }
}

async fn adapt(
    state: &AppState,
    body: &[u8],
    request_id: Option<&str>,
) -> Result<AdaptiveResponse, AdaptiveError> {
    let request: AdaptiveRequest =
        serde_json::from_slice(body).map_err(|_| AdaptiveError::InvalidJson)?;

    let catalog = state.recommendations.catalog();
    let company_id = normalize_id(request.company_id).ok_or(AdaptiveError::InvalidCompany)?;
    let company = catalog
        .company(&company_id)
        .ok_or(AdaptiveError::InvalidCompany)?;
    let persona_id = normalize_id(request.persona_id).ok_or(AdaptiveError::InvalidPersona)?;
    if company.persona(&persona_id).is_none() {
        return Err(AdaptiveError::InvalidPersona);
    }

    // No matching assets means no bundle.
    let bundle = state
        .recommendations
        .get_recommendation_bundle(&company_id, &persona_id)
        .filter(|bundle| !bundle.top_recommendations.is_empty())
        .ok_or(AdaptiveError::BundleUnavailable)?;

    let deterministic = visitor_narrative(&bundle);
    let provider = request.provider.as_deref().and_then(AiProvider::parse);
    let narrative = state
        .enrichment
        .resolve_narrative(provider, &bundle, deterministic, request_id)
        .await;

    Ok(AdaptiveResponse::new(&bundle, narrative))
}

fn normalize_id(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
}

/// GET /api/adaptive/profiles - Companies and personas available for personalization
#[utoipa::path(
    get,
    path = "/api/adaptive/profiles",
    tag = "Adaptive",
    responses(
        (status = 200, description = "Known companies and personas", body = ProfilesResponse)
    )
)]
pub async fn list_profiles(
    State(recommendations): State<Arc<RecommendationService>>,
) -> Json<ProfilesResponse> {
    let companies = recommendations
        .catalog()
        .companies()
        .iter()
        .map(|company| CompanyView {
            id: company.id.clone(),
            name: company.name.clone(),
            summary: company.summary.clone(),
            theme: company.theme.clone(),
            default_persona_id: company.default_persona_id.clone(),
            personas: company
                .personas
                .iter()
                .map(|persona| PersonaView {
                    id: persona.id.clone(),
                    name: persona.name.clone(),
                    role: persona.role.clone(),
                    recommendation_goal: persona.recommendation_goal.clone(),
                })
                .collect(),
        })
        .collect();

    Json(ProfilesResponse { companies })
}
