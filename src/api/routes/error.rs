//! API error handling utilities.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::ContactError;

/// API error response: `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        )
    }

    /// Render with extra response headers (rate-limit headers, request id).
    pub fn with_headers(self, headers: HeaderMap) -> Response {
        (headers, self).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
        });

        (self.status, Json(body)).into_response()
    }
}

/// Failures of the adaptive endpoint that reach the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdaptiveError {
    #[error("Invalid JSON body")]
    InvalidJson,
    #[error("Missing or unknown companyId")]
    InvalidCompany,
    #[error("Missing or unknown personaId for this company")]
    InvalidPersona,
    #[error("No recommendations available for this company and persona")]
    BundleUnavailable,
}

impl AdaptiveError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdaptiveError::InvalidJson
            | AdaptiveError::InvalidCompany
            | AdaptiveError::InvalidPersona => StatusCode::BAD_REQUEST,
            AdaptiveError::BundleUnavailable => StatusCode::NOT_FOUND,
        }
    }
}

impl From<AdaptiveError> for ApiError {
    fn from(err: AdaptiveError) -> Self {
        ApiError::new(err.status(), err.to_string())
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}
