//! Contact form route.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::error::ApiError;
use crate::middleware::build_api_request_context;
use crate::services::ContactSubmission;
use crate::services::contact_service::ContactRequest;

pub const CONTACT_NAMESPACE: &str = "contact";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Create the contact router
pub fn contact_router() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}

/// POST /api/contact - Accept a contact form submission
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Contact",
    request_body = ContactRequest,
    responses(
        (status = 202, description = "Submission accepted", body = ContactResponse),
        (status = 400, description = "Invalid JSON or failed validation"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = build_api_request_context(
        &headers,
        &state.rate_limiter,
        &state.request_ids,
        CONTACT_NAMESPACE,
        state.config.contact_rate_limit,
    );
    let request_id = ctx.request_id.as_deref().unwrap_or("-");

    if !ctx.is_allowed() {
        warn!(
            request_id,
            key = %ctx.rate_limit_key,
            "Rate limit exceeded for /api/contact"
        );
        return ApiError::too_many_requests().with_headers(ctx.exceeded_headers);
    }

    let request: ContactRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            return ApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON body")
                .with_headers(ctx.response_headers);
        }
    };

    let submission = match ContactSubmission::validate(request) {
        Ok(submission) => submission,
        Err(e) => {
            info!(request_id, "Contact submission rejected: {}", e);
            return ApiError::from(e).with_headers(ctx.response_headers);
        }
    };

    // Message body stays out of the logs.
    info!(
        request_id,
        name = %submission.name,
        email = %submission.email,
        company = submission.company.as_deref().unwrap_or("-"),
        message_chars = submission.message.chars().count(),
        "Contact submission received"
    );

    (
        StatusCode::ACCEPTED,
        ctx.response_headers,
        Json(ContactResponse {
            ok: true,
            request_id: ctx.request_id,
        }),
    )
        .into_response()
}
