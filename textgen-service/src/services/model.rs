//! The model wrapper the HTTP layer talks to.

use super::metrics;
use super::providers::{GenerationParams, ProviderError, TextProvider};
use std::sync::Arc;
use std::time::Instant;

/// A loaded text-generation model plus the decoding parameters it runs with.
///
/// Read-only after construction; share it behind an `Arc`.
pub struct TextModel {
    model_id: String,
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl TextModel {
    pub fn new(
        model_id: impl Into<String>,
        provider: Arc<dyn TextProvider>,
        params: GenerationParams,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            provider,
            params,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Generate text for `prompt` and return the top-ranked candidate.
    ///
    /// Provider failures are returned as-is: no retry, no fallback.
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let start = Instant::now();
        let result = self.provider.generate(prompt, &self.params).await;
        let elapsed = start.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    model = %self.model_id,
                    error = %e,
                    "Generation failed"
                );
                metrics::record_provider_error(self.provider.name(), e.kind());
                return Err(e);
            }
        };

        let Some(best) = response.candidates.into_iter().next() else {
            metrics::record_provider_error(self.provider.name(), ProviderError::NoCandidates.kind());
            return Err(ProviderError::NoCandidates);
        };

        metrics::record_generation(
            &self.model_id,
            best.finish_reason.as_str(),
            best.output_tokens,
            elapsed,
        );
        tracing::info!(
            model = %self.model_id,
            output_tokens = best.output_tokens,
            finish_reason = best.finish_reason.as_str(),
            duration_ms = (elapsed * 1000.0) as u64,
            "Generated response"
        );

        Ok(best.text)
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockProvider;
    use crate::services::providers::{FinishReason, GeneratedText, ProviderResponse};
    use async_trait::async_trait;

    /// Returns a fixed list of candidates regardless of the prompt.
    struct FixedProvider(Vec<&'static str>);

    #[async_trait]
    impl TextProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                candidates: self
                    .0
                    .iter()
                    .map(|text| GeneratedText {
                        text: text.to_string(),
                        output_tokens: 1,
                        finish_reason: FinishReason::Complete,
                    })
                    .collect(),
            })
        }

        async fn health_check(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn returns_first_candidate() {
        let model = TextModel::new(
            "fixed",
            Arc::new(FixedProvider(vec!["best", "runner-up"])),
            GenerationParams::default(),
        );

        assert_eq!(model.generate("anything").await.unwrap(), "best");
    }

    #[tokio::test]
    async fn empty_candidate_list_is_an_error() {
        let model = TextModel::new(
            "fixed",
            Arc::new(FixedProvider(vec![])),
            GenerationParams::default(),
        );

        assert!(matches!(
            model.generate("anything").await,
            Err(ProviderError::NoCandidates)
        ));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let model = TextModel::new(
            "mock",
            Arc::new(MockProvider::new(false)),
            GenerationParams::default(),
        );

        assert!(matches!(
            model.generate("Hello").await,
            Err(ProviderError::NotConfigured(_))
        ));
        assert!(model.health_check().await.is_err());
    }

    #[tokio::test]
    async fn passes_configured_params_to_provider() {
        let params = GenerationParams {
            max_length: 3,
            ..GenerationParams::default()
        };
        let model = TextModel::new("mock", Arc::new(MockProvider::new(true)), params);

        assert_eq!(model.params().max_length, 3);
        assert_eq!(model.generate("Hello").await.unwrap(), "Mock response for:");
    }
}
