#![allow(dead_code)]

use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use textgen_service::config::TextgenConfig;
use textgen_service::services::providers::mock::MockProvider;
use textgen_service::startup::{AppState, Application};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub state: AppState,
    pub client: reqwest::Client,
}

/// Configuration for a mock-backed service on a random port.
pub fn test_config() -> TextgenConfig {
    let common = CoreConfig {
        port: 0,
        log_level: "debug".to_string(),
    };
    TextgenConfig::from_lookup(common, |key| match key {
        "TEXTGEN_PROVIDER" => Some("mock".to_string()),
        _ => None,
    })
    .expect("Failed to build test configuration")
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_provider(MockProvider::new(true)).await
    }

    pub async fn spawn_with_provider(provider: MockProvider) -> Self {
        let app = Application::build_with_provider(test_config(), Arc::new(provider))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let state = app.state().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            state,
            client,
        }
    }

    pub async fn post_generate(&self, body: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/generate-response", self.address))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send request")
    }
}
