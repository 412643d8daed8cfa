//! Integration tests for POST /api/adaptive and GET /api/adaptive/profiles.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use portfolio_api::config::AppConfig;
use portfolio_api::middleware::RateLimitConfig;
use portfolio_api::routes::{AppState, create_app};
use portfolio_api::services::ai_service::EnrichmentError;
use portfolio_api::services::{AiProvider, Catalog, EnrichmentService, TextGenerator};
use serde_json::{Value, json};

const AI_REPLY: &str = "Welcome to Acme Capital. The revenue analytics platform and the cloud \
cost work show how engineering decisions land on the balance sheet.";

fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(create_app(state)).unwrap()
}

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

fn header_u64(response: &axum_test::TestResponse, name: &str) -> u64 {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap()
}

struct StubGenerator {
    provider: AiProvider,
    reply: Option<&'static str>,
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for StubGenerator {
    fn provider(&self) -> AiProvider {
        self.provider
    }

    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .map(str::to_string)
            .ok_or(EnrichmentError::MalformedResponse)
    }
}

#[tokio::test]
async fn test_adaptive_returns_deterministic_bundle() {
    let server = create_test_server(AppState::default());
    let (name, value) = forwarded_for("203.0.113.10");

    let response = server
        .post("/api/adaptive")
        .add_header(name, value)
        .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(header_u64(&response, "x-ratelimit-limit"), 40);
    assert_eq!(header_u64(&response, "x-ratelimit-remaining"), 39);
    assert_eq!(header_u64(&response, "x-ratelimit-reset"), 3_600);
    assert!(response.headers().get("x-request-id").is_some());

    let body: Value = response.json();
    assert_eq!(body["mode"]["companyId"], "acme");
    assert_eq!(body["mode"]["personaId"], "cfo");
    assert_eq!(body["companyName"], "Acme Capital");
    assert_eq!(body["narrativeSource"], "deterministic");
    assert!(body.get("aiNarrative").is_none());
    assert!(
        body["deterministicNarrative"]
            .as_str()
            .unwrap()
            .starts_with("Welcome, Acme Capital's CFO.")
    );

    let top = body["recommendations"].as_array().unwrap();
    assert!(!top.is_empty() && top.len() <= 4);
    assert_eq!(top[0]["url"], "/work/revenue-analytics");
    assert!(body["supportingRecommendations"].as_array().unwrap().len() <= 4);
    assert!(!body["highlights"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_adaptive_ids_are_case_insensitive() {
    let server = create_test_server(AppState::default());

    let response = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": " ACME ", "personaId": "Cto" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["mode"]["personaId"], "cto");
}

#[tokio::test]
async fn test_adaptive_reuses_incoming_request_id() {
    let server = create_test_server(AppState::default());

    let response = server
        .post("/api/adaptive")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc-123"),
        )
        .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-abc-123");
}

#[tokio::test]
async fn test_adaptive_validation_errors() {
    let server = create_test_server(AppState::default());

    let bogus_company = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "bogus", "personaId": "cfo" }))
        .await;
    assert_eq!(bogus_company.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = bogus_company.json();
    assert!(body["error"].as_str().unwrap().contains("companyId"));
    // Rejected requests still carry rate-limit headers
    assert!(bogus_company.headers().get("x-ratelimit-remaining").is_some());

    let missing_persona = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "acme" }))
        .await;
    assert_eq!(missing_persona.status_code(), StatusCode::BAD_REQUEST);

    let foreign_persona = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "acme", "personaId": "vp-eng" }))
        .await;
    assert_eq!(foreign_persona.status_code(), StatusCode::BAD_REQUEST);

    let not_json = server.post("/api/adaptive").text("not json").await;
    assert_eq!(not_json.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = not_json.json();
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn test_adaptive_returns_not_found_without_matching_assets() {
    let companies = Catalog::builtin().companies().to_vec();
    let state = AppState::default().with_catalog(Catalog::new(companies, Vec::new()));
    let server = create_test_server(state);

    let response = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "No recommendations available for this company and persona"
    );
    assert!(response.headers().get("x-ratelimit-remaining").is_some());
}

#[tokio::test]
async fn test_adaptive_rate_limit_per_ip() {
    let server = create_test_server(AppState::default());

    for _ in 0..40 {
        let (name, value) = forwarded_for("198.51.100.7");
        let response = server
            .post("/api/adaptive")
            .add_header(name, value)
            .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let (name, value) = forwarded_for("198.51.100.7");
    let limited = server
        .post("/api/adaptive")
        .add_header(name, value)
        .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_u64(&limited, "x-ratelimit-remaining"), 0);
    assert!(header_u64(&limited, "retry-after") >= 1);
    let body: Value = limited.json();
    assert!(body["error"].as_str().unwrap().contains("Rate limit"));

    // A different client is unaffected
    let (name, value) = forwarded_for("198.51.100.8");
    let other = server
        .post("/api/adaptive")
        .add_header(name, value)
        .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
        .await;
    assert_eq!(other.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_is_checked_before_validation() {
    let config = AppConfig {
        adaptive_rate_limit: RateLimitConfig::new(1, 60_000),
        ..AppConfig::default()
    };
    let server = create_test_server(AppState::new(config));

    let first = server.post("/api/adaptive").text("not json").await;
    assert_eq!(first.status_code(), StatusCode::BAD_REQUEST);

    let second = server.post("/api/adaptive").text("not json").await;
    assert_eq!(second.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_adaptive_uses_ai_narrative_when_provider_succeeds() {
    let generator = Arc::new(StubGenerator {
        provider: AiProvider::Anthropic,
        reply: Some(AI_REPLY),
        calls: AtomicUsize::new(0),
    });
    let enrichment =
        EnrichmentService::disabled(Duration::from_secs(2)).with_generator(generator.clone());
    let server = create_test_server(AppState::default().with_enrichment(enrichment));

    let response = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "acme", "personaId": "cfo", "provider": "anthropic" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["narrativeSource"], "ai");
    assert_eq!(body["aiNarrative"], AI_REPLY);
    assert!(body["deterministicNarrative"].as_str().is_some());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_adaptive_falls_back_when_provider_fails() {
    let generator = Arc::new(StubGenerator {
        provider: AiProvider::OpenAi,
        reply: None,
        calls: AtomicUsize::new(0),
    });
    let enrichment =
        EnrichmentService::disabled(Duration::from_secs(2)).with_generator(generator.clone());
    let server = create_test_server(AppState::default().with_enrichment(enrichment));

    let response = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "globex", "personaId": "vp-eng" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["narrativeSource"], "deterministic");
    assert!(body.get("aiNarrative").is_none());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_profiles_listing() {
    let server = create_test_server(AppState::default());

    let response = server.get("/api/adaptive/profiles").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let companies = body["companies"].as_array().unwrap();
    let acme = companies.iter().find(|c| c["id"] == "acme").unwrap();
    assert_eq!(acme["defaultPersonaId"], "cfo");
    let persona_ids: Vec<&str> = acme["personas"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert!(persona_ids.contains(&"cto"));
    assert!(persona_ids.contains(&"recruiter"));
    assert!(acme["theme"]["light"].is_string());
}
