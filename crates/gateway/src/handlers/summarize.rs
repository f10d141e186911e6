//! Summarization handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;
use validator::Validate;

use super::validation_error;
use crate::AppState;
use docqa_common::{
    errors::{AppError, Result},
    inference::SummaryOptions,
    language::LanguageTag,
    metrics,
};

/// Summarize request
#[derive(Debug, Deserialize, Validate)]
pub struct SummarizeRequest {
    #[validate(length(min = 1))]
    pub text: String,

    #[validate(range(min = 1, max = 1024))]
    pub max_length: Option<u32>,

    #[validate(range(max = 1024))]
    pub min_length: Option<u32>,
}

/// Summarize response
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub language: LanguageTag,
    pub model: String,
    pub summary: String,
    /// Whether the input was cut to the configured word limit
    pub truncated: bool,
    pub processing_time_ms: u64,
}

/// Summarize a document in its detected language
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>> {
    let start = Instant::now();

    request.validate().map_err(validation_error)?;
    if request.text.trim().is_empty() {
        return Err(AppError::Validation {
            message: "text must not be blank".to_string(),
            field: Some("text".to_string()),
        });
    }

    let options = summary_options(&state, &request)?;
    let (input, truncated) = leading_words(&request.text, state.config.inference.summary_max_input_words);

    let language = state.detector.detect(&request.text);
    let summarizer = state.summarizers.route(&language);

    let summary = summarizer.summarize(input, &options).await?;
    metrics::record_summary(language.as_str(), truncated);

    let processing_time_ms = start.elapsed().as_millis() as u64;
    info!(
        language = %language,
        model = summarizer.model_name(),
        truncated,
        processing_time_ms,
        "Document summarized"
    );

    Ok(Json(SummarizeResponse {
        language,
        model: summarizer.model_name().to_string(),
        summary,
        truncated,
        processing_time_ms,
    }))
}

/// Request bounds over configured defaults; an unset minimum never exceeds the maximum
fn summary_options(state: &AppState, request: &SummarizeRequest) -> Result<SummaryOptions> {
    let max_length = request
        .max_length
        .unwrap_or(state.config.inference.summary_max_length);

    let min_length = match request.min_length {
        Some(min) if min > max_length => {
            return Err(AppError::Validation {
                message: format!("min_length {} exceeds max_length {}", min, max_length),
                field: Some("min_length".to_string()),
            })
        }
        Some(min) => min,
        None => state.config.inference.summary_min_length.min(max_length),
    };

    Ok(SummaryOptions {
        max_length,
        min_length,
    })
}

/// Prefix of `text` holding at most `limit` words, and whether words were cut
fn leading_words(text: &str, limit: usize) -> (&str, bool) {
    let mut words = 0;
    let mut in_word = false;
    for (offset, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == limit {
                return (text[..offset].trim(), true);
            }
            in_word = true;
            words += 1;
        }
    }
    (text.trim(), false)
}
