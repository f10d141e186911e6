//! DocQA Common Library
//!
//! Shared code for the DocQA services including:
//! - Chunked question answering over long documents
//! - Hosted model clients (question answering, summarization)
//! - Language detection and per-language model routing
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod context;
pub mod errors;
pub mod inference;
pub mod language;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use context::{ChunkedQaResolver, Resolution};
pub use errors::{AppError, Result};
pub use inference::{QaCapability, Summarizer};
pub use language::{CapabilityRouter, LanguageDetector, LanguageTag};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
