//! Offline capabilities for tests and local runs without a model endpoint

use super::{InferenceError, QaCapability, QaOutput, Summarizer, SummaryOptions};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Deterministic QA: answers with the context sentence sharing the most
/// terms with the question, scored by the fraction of terms matched.
pub struct MockQa {
    model: String,
}

impl MockQa {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl QaCapability for MockQa {
    async fn answer(&self, question: &str, context: &str) -> Result<QaOutput, InferenceError> {
        let wanted = terms(question);
        if wanted.is_empty() {
            return Ok(QaOutput {
                answer: String::new(),
                score: 0.0,
            });
        }

        let mut best = ("", 0usize);
        for sentence in sentences(context) {
            let hits = terms(sentence).intersection(&wanted).count();
            if hits > best.1 {
                best = (sentence, hits);
            }
        }

        Ok(QaOutput {
            answer: best.0.to_string(),
            score: best.1 as f32 / wanted.len() as f32,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extractive stand-in: keeps leading sentences up to `max_length` words
pub struct MockSummarizer {
    model: String,
}

impl MockSummarizer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str, options: &SummaryOptions) -> Result<String, InferenceError> {
        let budget = options.max_length as usize;
        let mut summary: Vec<&str> = Vec::new();
        let mut words = 0;

        for sentence in sentences(text) {
            let len = sentence.split_whitespace().count();
            if !summary.is_empty() && words + len > budget {
                break;
            }
            summary.push(sentence);
            words += len;
        }

        if summary.is_empty() {
            return Err(InferenceError::InvalidResponse(
                "nothing to summarize".to_string(),
            ));
        }
        Ok(summary.join(" "))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// QA capability replaying canned responses keyed by exact context
pub struct ScriptedQa {
    model: String,
    responses: HashMap<String, Result<QaOutput, InferenceError>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl ScriptedQa {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            responses: HashMap::new(),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_answer(mut self, context: &str, answer: &str, score: f32) -> Self {
        self.responses.insert(
            context.to_string(),
            Ok(QaOutput {
                answer: answer.to_string(),
                score,
            }),
        );
        self
    }

    pub fn with_failure(mut self, context: &str, error: InferenceError) -> Self {
        self.responses.insert(context.to_string(), Err(error));
        self
    }

    /// Delay the response for `context`
    pub fn with_delay(mut self, context: &str, delay: Duration) -> Self {
        self.delays.insert(context.to_string(), delay);
        self
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QaCapability for ScriptedQa {
    async fn answer(&self, _question: &str, context: &str) -> Result<QaOutput, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(context) {
            tokio::time::sleep(*delay).await;
        }

        self.responses.get(context).cloned().unwrap_or_else(|| {
            Err(InferenceError::Unavailable(format!(
                "no scripted response for context {:?}",
                context
            )))
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_qa_picks_matching_sentence() {
        let qa = MockQa::new("mock");
        let context = "Rust was first released in 2015. The borrow checker enforces ownership rules.";
        let output = qa
            .answer("What enforces ownership rules?", context)
            .await
            .unwrap();
        assert_eq!(output.answer, "The borrow checker enforces ownership rules.");
        assert!(output.score > 0.5);
    }

    #[tokio::test]
    async fn test_mock_qa_no_overlap_scores_zero() {
        let qa = MockQa::new("mock");
        let output = qa.answer("Who painted Guernica?", "Tides follow the moon.").await.unwrap();
        assert_eq!(output.score, 0.0);
        assert!(output.answer.is_empty());
    }

    #[tokio::test]
    async fn test_mock_summarizer_respects_budget() {
        let summarizer = MockSummarizer::new("mock");
        let text = "One two three four. Five six seven eight. Nine ten eleven twelve.";
        let options = SummaryOptions {
            max_length: 8,
            min_length: 1,
        };
        let summary = summarizer.summarize(text, &options).await.unwrap();
        assert_eq!(summary, "One two three four. Five six seven eight.");

        assert!(summarizer.summarize("   ", &options).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_qa_replays_and_counts() {
        let qa = ScriptedQa::new("scripted")
            .with_answer("ctx-a", "alpha", 0.4)
            .with_failure("ctx-b", InferenceError::Request("connection reset".into()));

        assert_eq!(qa.answer("q", "ctx-a").await.unwrap().answer, "alpha");
        assert!(qa.answer("q", "ctx-b").await.is_err());
        assert!(matches!(
            qa.answer("q", "unknown").await,
            Err(InferenceError::Unavailable(_))
        ));
        assert_eq!(qa.calls(), 3);
    }
}
