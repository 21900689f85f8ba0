//! T5 provider implementation.
//!
//! Runs a T5 encoder-decoder model on the CPU with candle. Weights, config and
//! tokenizer are fetched from the Hugging Face hub (or its local cache) once,
//! at load time.

use super::{
    FinishReason, GeneratedText, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;

/// T5 provider configuration.
#[derive(Debug, Clone)]
pub struct T5Config {
    pub model_id: String,
    pub revision: String,
}

struct LoadedModel {
    model: t5::T5ForConditionalGeneration,
    config: t5::Config,
    tokenizer: Tokenizer,
    device: Device,
}

/// T5 text provider.
///
/// Decoding mutates the model's KV cache, so generations are serialised
/// through a mutex and executed on the blocking pool.
pub struct T5Provider {
    model_id: String,
    inner: Arc<Mutex<LoadedModel>>,
}

impl T5Provider {
    /// Download (or reuse cached) model files and map the weights.
    ///
    /// This blocks for as long as the download and load take; call it from a
    /// blocking context.
    pub fn load(config: &T5Config) -> Result<Self, ProviderError> {
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| ProviderError::ModelLoad(e.to_string()))?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));
        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                ProviderError::ModelLoad(format!(
                    "failed to fetch {} from {}: {}",
                    file, config.model_id, e
                ))
            })
        };

        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let raw_config = std::fs::read_to_string(&config_path)
            .map_err(|e| ProviderError::ModelLoad(format!("failed to read config: {}", e)))?;
        let model_config: t5::Config = serde_json::from_str(&raw_config)
            .map_err(|e| ProviderError::ModelLoad(format!("invalid model config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ProviderError::ModelLoad(format!("invalid tokenizer: {}", e)))?;

        // SAFETY: the weights file is owned by the hub cache and not modified
        // while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
        }
        .map_err(|e| ProviderError::ModelLoad(format!("failed to map weights: {}", e)))?;

        let model = t5::T5ForConditionalGeneration::load(vb, &model_config)
            .map_err(|e| ProviderError::ModelLoad(format!("failed to build model: {}", e)))?;

        tracing::info!(
            model = %config.model_id,
            revision = %config.revision,
            vocab_size = model_config.vocab_size,
            "Loaded T5 model"
        );

        Ok(Self {
            model_id: config.model_id.clone(),
            inner: Arc::new(Mutex::new(LoadedModel {
                model,
                config: model_config,
                tokenizer,
                device,
            })),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn run_generation(
    loaded: &mut LoadedModel,
    prompt: &str,
    params: &GenerationParams,
) -> anyhow::Result<GeneratedText> {
    let result = decode_sequence(loaded, prompt, params);
    loaded.model.clear_kv_cache();
    let (token_ids, finish_reason) = result?;

    let text = loaded
        .tokenizer
        .decode(&token_ids, true)
        .map_err(anyhow::Error::msg)?;

    Ok(GeneratedText {
        text,
        output_tokens: token_ids.len(),
        finish_reason,
    })
}

/// Returns the generated ids, without the decoder start token.
fn decode_sequence(
    loaded: &mut LoadedModel,
    prompt: &str,
    params: &GenerationParams,
) -> anyhow::Result<(Vec<u32>, FinishReason)> {
    let LoadedModel {
        model,
        config,
        tokenizer,
        device,
    } = loaded;

    let encoding = tokenizer.encode(prompt, true).map_err(anyhow::Error::msg)?;
    let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
    let encoder_output = model.encode(&input_ids)?;

    let start_token = config.decoder_start_token_id.unwrap_or(config.pad_token_id) as u32;
    let mut sequence = vec![start_token];
    let mut logits_processor = LogitsProcessor::new(params.seed, params.temperature, params.top_p);
    let mut finish_reason = FinishReason::Length;

    for step in 0..params.max_length {
        let decoder_ids = if step == 0 || !config.use_cache {
            Tensor::new(sequence.as_slice(), device)?.unsqueeze(0)?
        } else {
            let last = sequence[sequence.len() - 1];
            Tensor::new(&[last], device)?.unsqueeze(0)?
        };

        let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
        let next = logits_processor.sample(&logits)?;
        if next as usize == config.eos_token_id {
            finish_reason = FinishReason::Complete;
            break;
        }
        sequence.push(next);
    }

    sequence.remove(0);
    Ok((sequence, finish_reason))
}

#[async_trait]
impl TextProvider for T5Provider {
    fn name(&self) -> &'static str {
        "t5"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let inner = Arc::clone(&self.inner);
        let prompt = prompt.to_owned();
        let params = params.clone();

        tracing::debug!(
            model = %self.model_id,
            prompt_len = prompt.len(),
            max_length = params.max_length,
            "Running T5 generation"
        );

        let candidate = tokio::task::spawn_blocking(move || {
            let mut loaded = inner
                .lock()
                .map_err(|_| ProviderError::Inference("model lock poisoned".to_string()))?;
            run_generation(&mut loaded, &prompt, &params)
                .map_err(|e| ProviderError::Inference(format!("{:#}", e)))
        })
        .await
        .map_err(|e| ProviderError::Inference(format!("generation task failed: {}", e)))??;

        Ok(ProviderResponse {
            candidates: vec![candidate],
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.inner.is_poisoned() {
            Err(ProviderError::Inference("model lock poisoned".to_string()))
        } else {
            Ok(())
        }
    }
}
