//! Question answering handlers

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use validator::Validate;

use super::validation_error;
use crate::AppState;
use docqa_common::{
    config::ChunkingConfig,
    context::{ChunkedQaResolver, ResolverOptions},
    errors::{AppError, Result},
    language::LanguageTag,
};
use docqa_ingestion::{extractor_for, sniff_extractor};

/// Ask request over inline document text
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,

    /// Document text; may be empty
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    #[validate(nested)]
    pub options: AskOptions,
}

/// Per-request overrides of the configured chunking and threshold
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AskOptions {
    #[validate(range(min = 16, max = 4096))]
    pub max_tokens: Option<usize>,
    #[validate(range(max = 4095))]
    pub stride: Option<usize>,
    #[validate(range(min = 0.0, exclusive_max = 1.0))]
    pub min_score: Option<f32>,
}

/// Query string of a document upload
#[derive(Debug, Deserialize, Validate)]
pub struct DocumentQuery {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[validate(range(min = 16, max = 4096))]
    pub max_tokens: Option<usize>,
    #[validate(range(max = 4095))]
    pub stride: Option<usize>,
    #[validate(range(min = 0.0, exclusive_max = 1.0))]
    pub min_score: Option<f32>,
}

impl From<&DocumentQuery> for AskOptions {
    fn from(query: &DocumentQuery) -> Self {
        Self {
            max_tokens: query.max_tokens,
            stride: query.stride,
            min_score: query.min_score,
        }
    }
}

/// Ask response
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub language: LanguageTag,
    pub model: String,
    /// Absent when no chunk produced a confident answer
    pub answer: Option<String>,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    pub chunk_count: usize,
    pub failed_chunks: usize,
    pub processing_time_ms: u64,
}

/// Answer a question about inline text
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    request.validate().map_err(validation_error)?;

    let response = answer_text(&state, &request.question, &request.text, &request.options).await?;
    Ok(Json(response))
}

/// Answer a question about an uploaded PDF or text document
pub async fn ask_document(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AskResponse>> {
    query.validate().map_err(validation_error)?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let text = extract_upload(content_type, body).await?;
    let response = answer_text(&state, &query.question, &text, &AskOptions::from(&query)).await?;
    Ok(Json(response))
}

/// Extract text off the async runtime; PDF parsing is CPU bound
async fn extract_upload(content_type: Option<String>, body: Bytes) -> Result<String> {
    tokio::task::spawn_blocking(move || -> Result<String> {
        let extractor = match content_type.as_deref() {
            Some(ct) if !ct.starts_with("application/octet-stream") => extractor_for(ct)?,
            _ => sniff_extractor(&body),
        };
        info!(format = extractor.format(), bytes = body.len(), "Extracting uploaded document");
        Ok(extractor.extract(&body)?)
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("extraction task failed: {}", e),
    })?
}

/// Detect language, route to a QA model, chunk and resolve
#[instrument(skip_all, fields(question_len = question.len(), text_len = text.len()))]
async fn answer_text(
    state: &AppState,
    question: &str,
    text: &str,
    options: &AskOptions,
) -> Result<AskResponse> {
    let start = Instant::now();

    let chunking = ChunkingConfig {
        max_tokens: options.max_tokens.unwrap_or(state.config.chunking.max_tokens),
        stride: options.stride.unwrap_or(state.config.chunking.stride),
    };
    let mut resolver_options = ResolverOptions::from(&state.config.resolver);
    if let Some(min_score) = options.min_score {
        resolver_options.min_score = min_score;
    }

    let language = state.detector.detect(text);
    let resolver = ChunkedQaResolver::new(Arc::clone(state.qa.route(&language)), resolver_options);

    let resolution = resolver.answer_document(question, text, &chunking).await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    info!(
        language = %language,
        model = resolver.model_name(),
        found = resolution.is_found(),
        processing_time_ms,
        "Question answered"
    );

    let chunk_index = resolution.best.as_ref().map(|b| b.chunk_index);
    Ok(AskResponse {
        question: question.to_string(),
        language,
        model: resolver.model_name().to_string(),
        answer: resolution.best.map(|b| b.text),
        score: resolution.score,
        chunk_index,
        chunk_count: resolution.chunks_total,
        failed_chunks: resolution.chunks_failed,
        processing_time_ms,
    })
}
