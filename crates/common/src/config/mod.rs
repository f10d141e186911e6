//! Configuration management for DocQA services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values
//!
//! Every field has a default, so an empty environment yields a runnable
//! configuration backed by the mock inference provider.

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted model configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Chunk window configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Per-question resolution configuration
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum accepted request body (uploaded documents)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    /// Inference provider: huggingface, mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the inference service
    pub api_key: Option<String>,

    /// API base URL (for self-hosted endpoints)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// QA model used when no language-specific model matches
    #[serde(default = "default_qa_model")]
    pub qa_default_model: String,

    /// Language tag -> QA model
    #[serde(default = "default_qa_language_models")]
    pub qa_language_models: HashMap<String, String>,

    /// Summarization model
    #[serde(default = "default_summarization_model")]
    pub summarization_model: String,

    /// Summary length bounds in model tokens
    #[serde(default = "default_summary_max_length")]
    pub summary_max_length: u32,

    #[serde(default = "default_summary_min_length")]
    pub summary_min_length: u32,

    /// Words beyond this are dropped before summarization
    #[serde(default = "default_summary_max_input_words")]
    pub summary_max_input_words: usize,

    /// Request timeout in seconds
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures
    #[serde(default = "default_inference_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Window size in words
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Overlap between consecutive windows in words
    #[serde(default = "default_stride")]
    pub stride: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Maximum in-flight QA calls per question
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-chunk call timeout in seconds (0 disables)
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Answers must score strictly above this
    #[serde(default)]
    pub min_score: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (debug, info, docqa_common=debug)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_body_bytes() -> usize { 20 * 1024 * 1024 }
fn default_provider() -> String { "mock".to_string() }
fn default_api_base() -> String { "https://api-inference.huggingface.co/models".to_string() }
fn default_qa_model() -> String { "deepset/xlm-roberta-large-squad2".to_string() }
fn default_qa_language_models() -> HashMap<String, String> {
    HashMap::from([("en".to_string(), "deepset/roberta-base-squad2".to_string())])
}
fn default_summarization_model() -> String { "csebuetnlp/mT5_multilingual_XLSum".to_string() }
fn default_summary_max_length() -> u32 { 128 }
fn default_summary_min_length() -> u32 { 30 }
fn default_summary_max_input_words() -> usize { 1024 }
fn default_inference_timeout() -> u64 { 30 }
fn default_inference_retries() -> u32 { 3 }
fn default_max_tokens() -> usize { 400 }
fn default_stride() -> usize { 100 }
fn default_max_concurrency() -> usize { 4 }
fn default_call_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "docqa".to_string() }
fn default_rate_limit() -> u32 { 20 }
fn default_burst() -> u32 { 40 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl InferenceConfig {
    /// HTTP timeout for one inference request
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_base: default_api_base(),
            qa_default_model: default_qa_model(),
            qa_language_models: default_qa_language_models(),
            summarization_model: default_summarization_model(),
            summary_max_length: default_summary_max_length(),
            summary_min_length: default_summary_min_length(),
            summary_max_input_words: default_summary_max_input_words(),
            timeout_secs: default_inference_timeout(),
            max_retries: default_inference_retries(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            stride: default_stride(),
        }
    }
}

impl ChunkingConfig {
    /// Words the window advances per step, or an error if it would not advance
    pub fn step(&self) -> Result<usize> {
        if self.max_tokens == 0 {
            return Err(AppError::invalid_configuration(
                "max_tokens must be greater than zero",
            ));
        }
        if self.stride >= self.max_tokens {
            return Err(AppError::invalid_configuration(format!(
                "stride {} must be smaller than max_tokens {}",
                self.stride, self.max_tokens
            )));
        }
        Ok(self.max_tokens - self.stride)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            call_timeout_secs: default_call_timeout(),
            min_score: 0.0,
        }
    }
}

impl ResolverConfig {
    /// Per-call timeout, `None` when disabled
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__CHUNKING__MAX_TOKENS=512
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings that cannot work before anything is started
    pub fn validate(&self) -> Result<()> {
        self.chunking.step()?;

        if self.resolver.max_concurrency == 0 {
            return Err(AppError::invalid_configuration(
                "resolver.max_concurrency must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.resolver.min_score) {
            return Err(AppError::invalid_configuration(format!(
                "resolver.min_score {} must be in [0, 1)",
                self.resolver.min_score
            )));
        }
        if self.inference.summary_max_input_words == 0 {
            return Err(AppError::invalid_configuration(
                "inference.summary_max_input_words must be at least 1",
            ));
        }
        if self.inference.summary_min_length > self.inference.summary_max_length {
            return Err(AppError::invalid_configuration(format!(
                "summary_min_length {} exceeds summary_max_length {}",
                self.inference.summary_min_length, self.inference.summary_max_length
            )));
        }
        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chunking.max_tokens, 400);
        assert_eq!(config.chunking.stride, 100);
        assert_eq!(config.inference.provider, "mock");
        assert_eq!(
            config.inference.qa_language_models.get("en").map(String::as_str),
            Some("deepset/roberta-base-squad2")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chunking_step() {
        let chunking = ChunkingConfig { max_tokens: 400, stride: 100 };
        assert_eq!(chunking.step().unwrap(), 300);

        let stalled = ChunkingConfig { max_tokens: 100, stride: 100 };
        assert!(matches!(
            stalled.step(),
            Err(AppError::InvalidConfiguration { .. })
        ));

        let empty = ChunkingConfig { max_tokens: 0, stride: 0 };
        assert!(empty.step().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_resolver_settings() {
        let mut config = AppConfig::default();
        config.resolver.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.resolver.min_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_summary_input() {
        let mut config = AppConfig::default();
        config.inference.summary_max_input_words = 0;
        assert!(matches!(
            config.validate(),
            Err(AppError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_call_timeout_disabled_at_zero() {
        let mut resolver = ResolverConfig::default();
        assert_eq!(resolver.call_timeout(), Some(Duration::from_secs(30)));
        resolver.call_timeout_secs = 0;
        assert_eq!(resolver.call_timeout(), None);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = Config::builder()
            .set_override("chunking.max_tokens", 50)
            .unwrap()
            .set_override("inference.provider", "huggingface")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.chunking.max_tokens, 50);
        assert_eq!(config.chunking.stride, 100);
        assert!(config.validate().is_err());
        assert_eq!(config.inference.provider, "huggingface");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_sample_config_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
        let config = AppConfig::from_file(path).unwrap();

        assert_eq!(config.inference.provider, "mock");
        assert_eq!(config.chunking.max_tokens, 400);
        assert_eq!(config.chunking.stride, 100);
        assert_eq!(
            config.inference.qa_language_models.get("en").map(String::as_str),
            Some("deepset/roberta-base-squad2")
        );
        assert!(config.validate().is_ok());
    }
}
