//! Integration tests for the operational endpoints.

mod common;

use common::TestApp;
use reqwest::StatusCode;
use textgen_service::services::providers::mock::MockProvider;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "textgen-service");
    assert_eq!(body["model"], app.state.model.model_id());
}

#[tokio::test]
async fn readiness_check_returns_ok() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("http://localhost:{}/ready", app.port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn unhealthy_provider_fails_probes() {
    let app = TestApp::spawn_with_provider(MockProvider::new(false)).await;

    let health = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");

    let ready = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = ready.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Service unavailable" }));
}

#[tokio::test]
async fn metrics_expose_generation_counters() {
    let app = TestApp::spawn().await;

    let generated = app.post_generate(r#"{"query":"Hello"}"#).await;
    assert_eq!(generated.status(), StatusCode::OK);

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(text.contains("textgen_generations_total"));
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Not found");
}
