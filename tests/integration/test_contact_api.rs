//! Integration tests for POST /api/contact.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use portfolio_api::routes::{AppState, create_app};
use serde_json::{Value, json};

fn create_test_server() -> TestServer {
    TestServer::new(create_app(AppState::default())).unwrap()
}

fn valid_submission() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "message": "I'd like to talk about a staff engineering role.",
        "company": "Analytical Engines Ltd"
    })
}

#[tokio::test]
async fn test_contact_accepts_valid_submission() {
    let server = create_test_server();

    let response = server.post("/api/contact").json(&valid_submission()).await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    let request_id = body["requestId"].as_str().unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), request_id);
    assert_eq!(
        response.headers().get("x-ratelimit-limit").unwrap(),
        "5"
    );
}

#[tokio::test]
async fn test_contact_rejects_invalid_fields() {
    let server = create_test_server();

    let bad_email = server
        .post("/api/contact")
        .json(&json!({
            "name": "Ada",
            "email": "nope",
            "message": "Long enough message body"
        }))
        .await;
    assert_eq!(bad_email.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = bad_email.json();
    assert!(body["error"].as_str().unwrap().contains("email"));

    let short_message = server
        .post("/api/contact")
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "message": "hi" }))
        .await;
    assert_eq!(short_message.status_code(), StatusCode::BAD_REQUEST);

    let not_json = server.post("/api/contact").text("{").await;
    assert_eq!(not_json.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_rate_limit() {
    let server = create_test_server();

    for _ in 0..5 {
        let response = server
            .post("/api/contact")
            .add_header(
                HeaderName::from_static("x-real-ip"),
                HeaderValue::from_static("192.0.2.44"),
            )
            .json(&valid_submission())
            .await;
        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    }

    let limited = server
        .post("/api/contact")
        .add_header(
            HeaderName::from_static("x-real-ip"),
            HeaderValue::from_static("192.0.2.44"),
        )
        .json(&valid_submission())
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().get("retry-after").is_some());
}

#[tokio::test]
async fn test_contact_and_adaptive_limits_are_independent() {
    let server = create_test_server();

    for _ in 0..5 {
        server.post("/api/contact").json(&valid_submission()).await;
    }
    let limited = server.post("/api/contact").json(&valid_submission()).await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);

    let adaptive = server
        .post("/api/adaptive")
        .json(&json!({ "companyId": "acme", "personaId": "cfo" }))
        .await;
    assert_eq!(adaptive.status_code(), StatusCode::OK);
}
