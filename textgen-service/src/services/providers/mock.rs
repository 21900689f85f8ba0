//! Mock provider implementation for testing.

use super::{
    FinishReason, GeneratedText, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;

/// Mock text provider for testing.
///
/// Echoes the prompt back, one whitespace-separated word per "token", cut at
/// `max_length`.
pub struct MockProvider {
    enabled: bool,
}

impl MockProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let full = format!("Mock response for: {}", prompt);
        let words: Vec<&str> = full.split_whitespace().collect();
        let finish_reason = if words.len() > params.max_length {
            FinishReason::Length
        } else {
            FinishReason::Complete
        };
        let kept = &words[..words.len().min(params.max_length)];

        Ok(ProviderResponse {
            candidates: vec![GeneratedText {
                text: kept.join(" "),
                output_tokens: kept.len(),
                finish_reason,
            }],
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_prompt_as_single_candidate() {
        let provider = MockProvider::new(true);
        let response = provider
            .generate("Hello there", &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(response.candidates.len(), 1);
        let candidate = &response.candidates[0];
        assert_eq!(candidate.text, "Mock response for: Hello there");
        assert_eq!(candidate.output_tokens, 5);
        assert_eq!(candidate.finish_reason, FinishReason::Complete);
    }

    #[tokio::test]
    async fn truncates_at_max_length() {
        let provider = MockProvider::new(true);
        let params = GenerationParams {
            max_length: 2,
            ..GenerationParams::default()
        };
        let response = provider.generate("Hello there", &params).await.unwrap();

        let candidate = &response.candidates[0];
        assert_eq!(candidate.text, "Mock response");
        assert_eq!(candidate.finish_reason, FinishReason::Length);
    }

    #[tokio::test]
    async fn disabled_provider_fails() {
        let provider = MockProvider::new(false);

        assert!(matches!(
            provider.generate("Hello", &GenerationParams::default()).await,
            Err(ProviderError::NotConfigured(_))
        ));
        assert!(provider.health_check().await.is_err());
    }
}
