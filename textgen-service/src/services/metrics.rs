//! Metrics collection and Prometheus export.
//!
//! Installs the Prometheus recorder behind the `metrics` facade and provides
//! the text rendered by the /metrics endpoint, plus helpers for the
//! generation-specific series.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Safe to call more than once; only the first call installs a recorder.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if let Err(e) = metrics::set_global_recorder(recorder) {
            tracing::warn!("Metrics recorder already installed: {}", e);
        }
        handle
    });
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Record a completed generation.
pub fn record_generation(
    model: &str,
    finish_reason: &str,
    output_tokens: usize,
    duration_secs: f64,
) {
    let model = model.to_string();
    counter!(
        "textgen_generations_total",
        "model" => model.clone(),
        "finish_reason" => finish_reason.to_string()
    )
    .increment(1);
    counter!("textgen_output_tokens_total", "model" => model.clone())
        .increment(output_tokens as u64);
    histogram!("textgen_generation_duration_seconds", "model" => model).record(duration_secs);
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    counter!(
        "textgen_provider_errors_total",
        "provider" => provider.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}
