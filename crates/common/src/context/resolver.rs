//! Chunked QA resolution
//!
//! Answers one question against a document too long for a single model call:
//! every chunk is queried independently and the highest-confidence answer
//! across all chunks wins. A chunk whose call fails is logged, counted and
//! left out; it never fails the question.

use super::chunker::chunk_with;
use crate::config::{ChunkingConfig, ResolverConfig};
use crate::errors::{AppError, Result};
use crate::inference::{InferenceError, QaCapability, QaOutput};
use crate::metrics;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Answer produced by one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub text: String,
    pub score: f32,
    pub chunk_index: usize,
}

/// Outcome of resolving one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Best answer, absent when no chunk scored above the threshold
    pub best: Option<CandidateAnswer>,
    /// Highest score among chunks that answered, blank spans included (0 when none did)
    pub score: f32,
    pub chunks_total: usize,
    pub chunks_failed: usize,
}

impl Resolution {
    pub fn answer(&self) -> Option<&str> {
        self.best.as_ref().map(|b| b.text.as_str())
    }

    pub fn is_found(&self) -> bool {
        self.best.is_some()
    }
}

/// Resolver tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverOptions {
    /// In-flight QA calls per question; 1 queries chunks in order
    pub max_concurrency: usize,
    /// A call exceeding this counts as a failed chunk
    pub call_timeout: Option<Duration>,
    /// Reported answers must score strictly above this
    pub min_score: f32,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            call_timeout: None,
            min_score: 0.0,
        }
    }
}

impl From<&ResolverConfig> for ResolverOptions {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            call_timeout: config.call_timeout(),
            min_score: config.min_score,
        }
    }
}

/// Running maximum over chunk results.
///
/// The winner is the highest score, ties going to the lowest chunk index,
/// so the outcome does not depend on the order results arrive in.
#[derive(Debug)]
struct Aggregate {
    top: Option<CandidateAnswer>,
    max_score: f32,
    total: usize,
    failed: usize,
}

impl Aggregate {
    fn new() -> Self {
        Self {
            top: None,
            max_score: 0.0,
            total: 0,
            failed: 0,
        }
    }

    fn record(&mut self, chunk_index: usize, result: std::result::Result<QaOutput, InferenceError>) {
        self.total += 1;

        let output = match result {
            Ok(output) if output.score.is_finite() => output,
            Ok(output) => {
                self.fail(chunk_index, &InferenceError::InvalidResponse(format!(
                    "non-finite score {}",
                    output.score
                )));
                return;
            }
            Err(e) => {
                self.fail(chunk_index, &e);
                return;
            }
        };

        debug!(chunk_index, score = output.score, "Chunk answered");
        self.max_score = self.max_score.max(output.score);

        // A blank span scores but is never reported as the answer
        if output.answer.trim().is_empty() {
            return;
        }

        let replaces = match &self.top {
            None => true,
            Some(top) => {
                output.score > top.score
                    || (output.score == top.score && chunk_index < top.chunk_index)
            }
        };

        if replaces {
            self.top = Some(CandidateAnswer {
                text: output.answer,
                score: output.score,
                chunk_index,
            });
        }
    }

    fn fail(&mut self, chunk_index: usize, error: &InferenceError) {
        self.failed += 1;
        warn!(chunk_index, error = %error, "Chunk inference failed, skipping");
    }

    fn finish(self, min_score: f32) -> Resolution {
        Resolution {
            best: self.top.filter(|t| t.score > min_score),
            score: self.max_score,
            chunks_total: self.total,
            chunks_failed: self.failed,
        }
    }
}

fn ensure_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(AppError::Validation {
            message: "question must not be empty".to_string(),
            field: Some("question".to_string()),
        });
    }
    Ok(())
}

async fn ask(
    qa: &dyn QaCapability,
    question: &str,
    context: &str,
    timeout: Option<Duration>,
) -> std::result::Result<QaOutput, InferenceError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, qa.answer(question, context))
            .await
            .unwrap_or_else(|_| {
                Err(InferenceError::Timeout {
                    timeout_ms: limit.as_millis() as u64,
                })
            }),
        None => qa.answer(question, context).await,
    }
}

/// Query `qa` with every chunk in order and keep the best-scoring answer.
///
/// Failed chunks are skipped. With no chunks, or when every chunk fails,
/// the result has no answer and a score of 0.
pub async fn resolve_best_answer<I, S>(
    question: &str,
    chunks: I,
    qa: &dyn QaCapability,
) -> Result<Resolution>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ensure_question(question)?;

    let mut aggregate = Aggregate::new();
    for (index, chunk) in chunks.into_iter().enumerate() {
        let result = ask(qa, question, chunk.as_ref(), None).await;
        aggregate.record(index, result);
    }

    Ok(aggregate.finish(0.0))
}

/// Resolver bound to one QA capability.
///
/// Queries up to `max_concurrency` chunks at a time, each under the
/// optional per-call timeout.
#[derive(Clone)]
pub struct ChunkedQaResolver {
    capability: Arc<dyn QaCapability>,
    options: ResolverOptions,
}

impl ChunkedQaResolver {
    pub fn new(capability: Arc<dyn QaCapability>, options: ResolverOptions) -> Self {
        Self {
            capability,
            options,
        }
    }

    pub fn model_name(&self) -> &str {
        self.capability.model_name()
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve `question` against already-chunked text
    #[instrument(skip_all, fields(model = %self.capability.model_name()))]
    pub async fn resolve<I, S>(&self, question: &str, chunks: I) -> Result<Resolution>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ensure_question(question)?;

        let start = Instant::now();
        let question: Arc<str> = Arc::from(question);
        let timeout = self.options.call_timeout;

        // Each call owns its inputs so the stream stays Send
        let calls: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let qa = Arc::clone(&self.capability);
                let question = Arc::clone(&question);
                let context = chunk.as_ref().to_owned();
                async move { (index, ask(qa.as_ref(), &question, &context, timeout).await) }
            })
            .collect();

        let mut results =
            stream::iter(calls).buffer_unordered(self.options.max_concurrency.max(1));

        let mut aggregate = Aggregate::new();
        while let Some((index, result)) = results.next().await {
            aggregate.record(index, result);
        }

        let resolution = aggregate.finish(self.options.min_score);

        info!(
            chunks = resolution.chunks_total,
            failed = resolution.chunks_failed,
            found = resolution.is_found(),
            score = resolution.score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Question resolved"
        );

        metrics::record_resolution(
            start.elapsed().as_secs_f64(),
            self.capability.model_name(),
            resolution.chunks_total,
            resolution.chunks_failed,
            resolution.is_found(),
        );

        Ok(resolution)
    }

    /// Chunk `text` and resolve `question` against it
    pub async fn answer_document(
        &self,
        question: &str,
        text: &str,
        chunking: &ChunkingConfig,
    ) -> Result<Resolution> {
        let chunks = chunk_with(text, chunking)?;
        self.resolve(question, chunks).await
    }
}
