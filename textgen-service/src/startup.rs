//! Application startup and lifecycle management.
//!
//! The model is loaded before the listener is bound, so the server never
//! accepts a connection it cannot answer.

use crate::config::{ModelConfig, ProviderKind, TextgenConfig};
use crate::handlers::{
    generate::generate_response,
    health::{health_check, readiness_check},
    metrics::metrics,
    not_found,
};
use crate::services::metrics::init_metrics;
use crate::services::providers::mock::MockProvider;
use crate::services::providers::t5::{T5Config, T5Provider};
use crate::services::providers::{GenerationParams, TextProvider};
use crate::services::TextModel;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<TextModel>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generate-response", post(generate_response))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .with_state(state)
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Load the configured provider. For T5 this downloads and maps the weights.
pub async fn load_provider(config: &ModelConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.provider {
        ProviderKind::Mock => Ok(Arc::new(MockProvider::new(true))),
        ProviderKind::T5 => {
            let t5_config = T5Config {
                model_id: config.model_id.clone(),
                revision: config.revision.clone(),
            };
            tracing::info!(model = %t5_config.model_id, "Loading T5 model");

            let provider = tokio::task::spawn_blocking(move || T5Provider::load(&t5_config))
                .await
                .map_err(|e| anyhow::anyhow!("Model loading task failed: {}", e))?
                .map_err(|e| {
                    tracing::error!("Failed to load model: {}", e);
                    e
                })?;

            tracing::info!(model = %provider.model_id(), "Initialized T5 text provider");
            Ok(Arc::new(provider))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Blocks until the model is loaded.
    pub async fn build(config: TextgenConfig) -> Result<Self, AppError> {
        let provider = load_provider(&config.model).await?;
        Self::build_with_provider(config, provider).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: TextgenConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let model_id = match config.model.provider {
            ProviderKind::T5 => config.model.model_id.clone(),
            ProviderKind::Mock => provider.name().to_string(),
        };
        let params = GenerationParams {
            max_length: config.model.max_length,
            temperature: config.model.temperature,
            top_p: config.model.top_p,
            seed: config.model.seed,
        };
        let model = Arc::new(TextModel::new(model_id, provider, params));

        let state = AppState { model };

        // Bind HTTP listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            model = %state.model.model_id(),
            max_length = config.model.max_length,
            "Textgen service listening on port {}",
            port
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
