use dotenvy::dotenv;
use service_core::observability::init_tracing;
use textgen_service::config::TextgenConfig;
use textgen_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = TextgenConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "textgen-service",
        &config.common.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        provider = %config.model.provider,
        model = %config.model.model_id,
        "Starting textgen-service"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    app.run_until_stopped().await?;

    tracing::info!("textgen-service stopped");
    Ok(())
}
