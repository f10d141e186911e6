//! Model inference abstraction
//!
//! Provides a unified interface over hosted pretrained pipelines:
//! - Extractive question answering (question + context -> answer span + score)
//! - Abstractive summarization (document -> summary text)
//!
//! Capabilities are constructed once at startup and shared behind `Arc`.

mod huggingface;
mod mock;

pub use huggingface::{HuggingFaceClient, HuggingFaceQa, HuggingFaceSummarizer};
pub use mock::{MockQa, MockSummarizer, ScriptedQa};

use crate::config::InferenceConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Answer span extracted from a single context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaOutput {
    pub answer: String,
    /// Model confidence in [0, 1]
    pub score: f32,
}

/// Summary length bounds, in model tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub max_length: u32,
    pub min_length: u32,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_length: 128,
            min_length: 30,
        }
    }
}

/// Failure of one inference call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("inference API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid inference response: {0}")]
    InvalidResponse(String),

    #[error("inference call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("model unavailable: {0}")]
    Unavailable(String),
}

impl InferenceError {
    /// Whether repeating the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            InferenceError::Request(_) | InferenceError::Timeout { .. } => true,
            InferenceError::Status { status, .. } => *status == 429 || *status >= 500,
            InferenceError::InvalidResponse(_) | InferenceError::Unavailable(_) => false,
        }
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Timeout { timeout_ms } => AppError::InferenceTimeout { timeout_ms },
            InferenceError::Unavailable(message) => AppError::ServiceUnavailable { message },
            other => AppError::Inference {
                message: other.to_string(),
            },
        }
    }
}

/// Trait for extractive question answering over a bounded context
#[async_trait]
pub trait QaCapability: Send + Sync {
    /// Extract the best answer span for `question` from `context`
    async fn answer(&self, question: &str, context: &str) -> std::result::Result<QaOutput, InferenceError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Trait for document summarization
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text` within the given length bounds
    async fn summarize(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> std::result::Result<String, InferenceError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a QA capability for `model` based on configuration
pub fn create_qa(config: &InferenceConfig, model: &str) -> Result<Arc<dyn QaCapability>> {
    match config.provider.as_str() {
        "huggingface" => {
            let client = HuggingFaceClient::from_config(config)?;
            Ok(Arc::new(HuggingFaceQa::new(client, model)))
        }
        "mock" => Ok(Arc::new(MockQa::new(model))),
        other => Err(AppError::Configuration {
            message: format!("unknown inference provider: {}", other),
        }),
    }
}

/// Create a summarizer based on configuration
pub fn create_summarizer(config: &InferenceConfig) -> Result<Arc<dyn Summarizer>> {
    match config.provider.as_str() {
        "huggingface" => {
            let client = HuggingFaceClient::from_config(config)?;
            Ok(Arc::new(HuggingFaceSummarizer::new(
                client,
                &config.summarization_model,
            )))
        }
        "mock" => Ok(Arc::new(MockSummarizer::new(&config.summarization_model))),
        other => Err(AppError::Configuration {
            message: format!("unknown inference provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(InferenceError::Status { status: 503, body: String::new() }.is_transient());
        assert!(InferenceError::Status { status: 429, body: String::new() }.is_transient());
        assert!(!InferenceError::Status { status: 400, body: String::new() }.is_transient());
        assert!(InferenceError::Timeout { timeout_ms: 10 }.is_transient());
        assert!(!InferenceError::InvalidResponse("score is NaN".into()).is_transient());
    }

    #[test]
    fn test_error_conversion() {
        let err: AppError = InferenceError::Timeout { timeout_ms: 250 }.into();
        assert!(matches!(err, AppError::InferenceTimeout { timeout_ms: 250 }));

        let err: AppError = InferenceError::Status { status: 500, body: "boom".into() }.into();
        assert!(matches!(err, AppError::Inference { .. }));
    }

    #[test]
    fn test_factory_providers() {
        let config = InferenceConfig::default();
        let qa = create_qa(&config, "deepset/roberta-base-squad2").unwrap();
        assert_eq!(qa.model_name(), "deepset/roberta-base-squad2");

        let summarizer = create_summarizer(&config).unwrap();
        assert_eq!(summarizer.model_name(), "csebuetnlp/mT5_multilingual_XLSum");

        let unknown = InferenceConfig {
            provider: "onnx".into(),
            ..InferenceConfig::default()
        };
        assert!(matches!(
            create_qa(&unknown, "m"),
            Err(AppError::Configuration { .. })
        ));
    }
}
