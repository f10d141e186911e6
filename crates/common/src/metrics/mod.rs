//! Metrics and observability utilities
//!
//! Provides Prometheus metrics through the `metrics` facade with
//! standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DocQA metrics
pub const METRICS_PREFIX: &str = "docqa";

/// Buckets for inference latency (hosted models are slow to warm up)
pub const INFERENCE_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Resolution metrics
    describe_counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Questions resolved, labelled by whether an answer was found"
    );

    describe_counter!(
        format!("{}_chunks_queried_total", METRICS_PREFIX),
        Unit::Count,
        "Document chunks sent to a QA model"
    );

    describe_histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time to resolve one question across all chunks"
    );

    // Inference metrics
    describe_counter!(
        format!("{}_inference_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total inference API calls"
    );

    describe_histogram!(
        format!("{}_inference_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Inference call latency in seconds"
    );

    describe_counter!(
        format!("{}_inference_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Inference calls that failed or timed out"
    );

    // Summarization metrics
    describe_counter!(
        format!("{}_summaries_total", METRICS_PREFIX),
        Unit::Count,
        "Documents summarized"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one resolved question
pub fn record_resolution(duration_secs: f64, model: &str, chunks: usize, failed: usize, found: bool) {
    counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "found" => found.to_string()
    )
    .increment(1);

    counter!(
        format!("{}_chunks_queried_total", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .increment(chunks as u64);

    if failed > 0 {
        counter!(
            format!("{}_inference_failures_total", METRICS_PREFIX),
            "model" => model.to_string(),
            "task" => "question_answering"
        )
        .increment(failed as u64);
    }

    histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .record(duration_secs);
}

/// Helper to record inference call metrics
pub fn record_inference(duration_secs: f64, model: &str, task: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_inference_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "task" => task.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_inference_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string(),
            "task" => task.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record summarization metrics
pub fn record_summary(language: &str, truncated: bool) {
    counter!(
        format!("{}_summaries_total", METRICS_PREFIX),
        "language" => language.to_string(),
        "truncated" => truncated.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in INFERENCE_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        // Without an installed recorder the facade is a no-op
        let metrics = RequestMetrics::start("POST", "/v1/ask");
        metrics.finish(200);
        record_resolution(0.2, "mock", 3, 1, true);
        record_inference(0.1, "mock", "question_answering", false);
        record_summary("en", false);
    }
}
