use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Hub id of the model served when none is configured.
pub const DEFAULT_MODEL_ID: &str = "google-t5/t5-small";
const DEFAULT_MODEL_REVISION: &str = "main";
/// Upper bound on generated tokens per request.
pub const DEFAULT_MAX_LENGTH: usize = 100;
pub const DEFAULT_SEED: u64 = 299_792_458;

#[derive(Debug, Clone)]
pub struct TextgenConfig {
    pub common: core_config::Config,
    pub model: ModelConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    /// Hugging Face hub id, e.g. `google-t5/t5-small`
    pub model_id: String,
    pub revision: String,
    pub max_length: usize,
    /// Unset means greedy decoding.
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub seed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    pub otlp_endpoint: Option<String>,
}

/// Backend used to serve generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    T5,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::T5 => "t5",
            ProviderKind::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t5" => Ok(ProviderKind::T5),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown TEXTGEN_PROVIDER '{}', expected 't5' or 'mock'",
                other
            ))),
        }
    }
}

impl TextgenConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the service settings from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let vars = Vars {
            lookup: &lookup,
            is_prod,
        };

        Ok(TextgenConfig {
            common,
            model: ModelConfig {
                provider: vars.required("TEXTGEN_PROVIDER", Some("t5"))?.parse()?,
                model_id: vars.required("TEXTGEN_MODEL_ID", Some(DEFAULT_MODEL_ID))?,
                revision: vars.required("TEXTGEN_MODEL_REVISION", Some(DEFAULT_MODEL_REVISION))?,
                max_length: parse(
                    "TEXTGEN_MAX_LENGTH",
                    &vars.required("TEXTGEN_MAX_LENGTH", Some(&DEFAULT_MAX_LENGTH.to_string()))?,
                )?,
                temperature: vars
                    .optional("TEXTGEN_TEMPERATURE")
                    .map(|v| parse("TEXTGEN_TEMPERATURE", &v))
                    .transpose()?,
                top_p: vars
                    .optional("TEXTGEN_TOP_P")
                    .map(|v| parse("TEXTGEN_TOP_P", &v))
                    .transpose()?,
                seed: parse(
                    "TEXTGEN_SEED",
                    &vars.required("TEXTGEN_SEED", Some(&DEFAULT_SEED.to_string()))?,
                )?,
            },
            observability: ObservabilityConfig {
                otlp_endpoint: vars.optional("OTLP_ENDPOINT"),
            },
        })
        .and_then(TextgenConfig::validated)
    }

    fn validated(self) -> Result<Self, AppError> {
        if self.model.max_length == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TEXTGEN_MAX_LENGTH must be greater than zero"
            )));
        }
        if let Some(t) = self.model.temperature {
            if t < 0.0 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "TEXTGEN_TEMPERATURE must not be negative"
                )));
            }
        }
        if let Some(p) = self.model.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "TEXTGEN_TOP_P must be within [0, 1]"
                )));
            }
        }
        Ok(self)
    }
}

struct Vars<'a, F> {
    lookup: &'a F,
    is_prod: bool,
}

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str, default: Option<&str>) -> Result<String, AppError> {
        match (self.lookup)(key) {
            Some(val) => Ok(val),
            None => {
                if self.is_prod {
                    Err(AppError::ConfigError(anyhow::anyhow!(
                        "{} is required in production but not set",
                        key
                    )))
                } else if let Some(def) = default {
                    Ok(def.to_string())
                } else {
                    Err(AppError::ConfigError(anyhow::anyhow!(
                        "{} is required but not set",
                        key
                    )))
                }
            }
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
