//! Hugging Face Inference API clients
//!
//! Wire format:
//! - question-answering: `{"inputs": {"question", "context"}}` -> `{"answer", "score", ...}`
//! - summarization: `{"inputs", "parameters"}` -> `[{"summary_text"}]`

use super::{InferenceError, QaCapability, QaOutput, Summarizer, SummaryOptions};
use crate::config::InferenceConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{Duration, Instant};

const PUBLIC_API_HOST: &str = "huggingface.co";

/// Shared HTTP client for one inference endpoint
#[derive(Clone)]
pub struct HuggingFaceClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HuggingFaceClient {
    /// Create a client; the public API requires a key, self-hosted endpoints may not
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let api_base = api_base.into().trim_end_matches('/').to_string();

        if api_key.is_none() && api_base.contains(PUBLIC_API_HOST) {
            return Err(AppError::Configuration {
                message: "inference.api_key is required for the hosted Hugging Face API"
                    .to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_base,
            api_key,
            timeout,
            max_retries,
            initial_backoff: Duration::from_millis(200),
        })
    }

    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.timeout(),
            config.max_retries,
        )
    }

    /// Override the first retry delay
    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// POST `body` to the model endpoint, retrying transient failures
    async fn post<Req, Resp>(&self, model: &str, body: &Req) -> std::result::Result<Resp, InferenceError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_base, model);
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(None)
            .build();

        let max_attempts = self.max_retries + 1;
        let mut attempt = 0u32;

        backoff::future::retry_notify(
            policy,
            || {
                attempt += 1;
                let current = attempt;
                let url = &url;
                async move {
                    self.send_once(url, body).await.map_err(|e| {
                        if e.is_transient() && current < max_attempts {
                            backoff::Error::transient(e)
                        } else {
                            backoff::Error::permanent(e)
                        }
                    })
                }
            },
            |err: InferenceError, delay: Duration| {
                tracing::warn!(
                    model = model,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Inference request failed, retrying"
                );
            },
        )
        .await
    }

    async fn send_once<Req, Resp>(&self, url: &str, body: &Req) -> std::result::Result<Resp, InferenceError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                InferenceError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| InferenceError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[derive(Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct QaResponse {
    answer: String,
    score: f64,
}

/// Some deployments wrap the single answer in a list
#[derive(Deserialize)]
#[serde(untagged)]
enum QaResponseBody {
    Single(QaResponse),
    List(Vec<QaResponse>),
}

impl QaResponseBody {
    fn into_output(self) -> std::result::Result<QaOutput, InferenceError> {
        let response = match self {
            QaResponseBody::Single(r) => r,
            QaResponseBody::List(list) => list
                .into_iter()
                .max_by(|a, b| a.score.total_cmp(&b.score))
                .ok_or_else(|| InferenceError::InvalidResponse("empty answer list".to_string()))?,
        };

        if !response.score.is_finite() {
            return Err(InferenceError::InvalidResponse(format!(
                "non-finite score {}",
                response.score
            )));
        }

        Ok(QaOutput {
            answer: response.answer.trim().to_string(),
            score: response.score.clamp(0.0, 1.0) as f32,
        })
    }
}

/// Extractive QA over the Inference API
pub struct HuggingFaceQa {
    client: HuggingFaceClient,
    model: String,
}

impl HuggingFaceQa {
    pub fn new(client: HuggingFaceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl QaCapability for HuggingFaceQa {
    async fn answer(&self, question: &str, context: &str) -> std::result::Result<QaOutput, InferenceError> {
        let start = Instant::now();
        let request = QaRequest {
            inputs: QaInputs { question, context },
        };

        let result = self
            .client
            .post::<_, QaResponseBody>(&self.model, &request)
            .await
            .and_then(QaResponseBody::into_output);

        metrics::record_inference(
            start.elapsed().as_secs_f64(),
            &self.model,
            "question_answering",
            result.is_ok(),
        );
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    inputs: &'a str,
    parameters: SummaryParameters,
}

#[derive(Serialize)]
struct SummaryParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary_text: String,
}

/// Abstractive summarization over the Inference API
pub struct HuggingFaceSummarizer {
    client: HuggingFaceClient,
    model: String,
}

impl HuggingFaceSummarizer {
    pub fn new(client: HuggingFaceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> std::result::Result<String, InferenceError> {
        let start = Instant::now();
        let request = SummaryRequest {
            inputs: text,
            parameters: SummaryParameters {
                max_length: options.max_length,
                min_length: options.min_length,
                do_sample: false,
            },
        };

        let result = self
            .client
            .post::<_, Vec<SummaryResponse>>(&self.model, &request)
            .await
            .and_then(|summaries| {
                summaries
                    .into_iter()
                    .next()
                    .map(|s| s.summary_text.trim().to_string())
                    .ok_or_else(|| InferenceError::InvalidResponse("empty summary list".to_string()))
            });

        metrics::record_inference(
            start.elapsed().as_secs_f64(),
            &self.model,
            "summarization",
            result.is_ok(),
        );
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
