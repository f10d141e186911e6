//! Language detection and language-based capability routing
//!
//! Detection never fails: text that cannot be classified is tagged
//! [`LanguageTag::Unknown`], and routers send unknown text to their default
//! capability.

mod detect;
mod router;

pub use detect::ScriptDetector;
pub use router::{build_qa_router, CapabilityRouter};

use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 639-1 style language tag, or the unknown sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageTag {
    Known(String),
    Unknown,
}

impl LanguageTag {
    pub const UNKNOWN: &'static str = "unknown";

    /// Normalize a tag; empty input or `"unknown"` maps to the sentinel
    pub fn new(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        if code.is_empty() || code == Self::UNKNOWN {
            LanguageTag::Unknown
        } else {
            LanguageTag::Known(code)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LanguageTag::Known(code) => code,
            LanguageTag::Unknown => Self::UNKNOWN,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, LanguageTag::Known(_))
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LanguageTag {
    fn from(code: String) -> Self {
        LanguageTag::new(&code)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.as_str().to_string()
    }
}

/// Result of language detection for a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub language: LanguageTag,
    /// Confidence score (0.0 - 1.0), 0 for unknown
    pub confidence: f32,
}

impl Detection {
    pub fn unknown() -> Self {
        Self {
            language: LanguageTag::Unknown,
            confidence: 0.0,
        }
    }
}

/// Trait for language detection
pub trait LanguageDetector: Send + Sync {
    /// Classify `text`; unclassifiable text yields an unknown detection
    fn detect_with_confidence(&self, text: &str) -> Detection;

    /// Classify `text`, returning only the tag
    fn detect(&self, text: &str) -> LanguageTag {
        self.detect_with_confidence(text).language
    }
}
