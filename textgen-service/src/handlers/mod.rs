//! HTTP handlers for the textgen service.

pub mod generate;
pub mod health;
pub mod metrics;

use service_core::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not found"))
}
