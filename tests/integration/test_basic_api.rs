//! Basic API integration tests

use axum::http::StatusCode;
use axum_test::TestServer;
use portfolio_api::routes::{AppState, create_app};
use serde_json::Value;

fn create_test_server() -> TestServer {
    TestServer::new(create_app(AppState::default())).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let server = create_test_server();

    let response = server.get("/api/openapi.json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert!(body["paths"].get("/api/adaptive").is_some());
    assert!(body["paths"].get("/api/contact").is_some());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = create_test_server();

    let response = server.get("/api/does-not-exist").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
