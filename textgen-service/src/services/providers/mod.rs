//! Text-generation provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction over the model backend,
//! allowing the locally loaded T5 model to be swapped for a mock in tests.

pub mod mock;
pub mod t5;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model returned no candidates")]
    NoCandidates,
}

impl ProviderError {
    /// Short label used for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ModelLoad(_) => "model_load",
            ProviderError::Inference(_) => "inference",
            ProviderError::NoCandidates => "no_candidates",
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The model emitted its end-of-sequence token.
    Complete,
    /// The output hit `max_length`.
    Length,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
        }
    }
}

/// One generated sequence.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    pub text: String,
    pub output_tokens: usize,
    pub finish_reason: FinishReason,
}

/// Result of a provider call. Candidates are ordered best-first.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub candidates: Vec<GeneratedText>,
}

/// Decoding parameters for a generation.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Maximum number of output tokens.
    pub max_length: usize,

    /// Temperature; `None` selects greedy decoding.
    pub temperature: Option<f64>,

    /// Top-p sampling.
    pub top_p: Option<f64>,

    /// Sampler seed.
    pub seed: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: crate::config::DEFAULT_MAX_LENGTH,
            temperature: None,
            top_p: None,
            seed: crate::config::DEFAULT_SEED,
        }
    }
}

/// Trait for text generation backends.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short backend name, used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Generate completions for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

impl From<ProviderError> for service_core::error::AppError {
    fn from(err: ProviderError) -> Self {
        service_core::error::AppError::InternalError(anyhow::Error::new(err))
    }
}
