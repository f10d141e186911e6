//! Health check handlers

use crate::AppState;
use axum::{extract::State, Json};
use docqa_common::language::LanguageTag;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub provider: String,
    pub models: ModelReport,
}

#[derive(Serialize)]
pub struct ModelReport {
    /// QA model used for unknown or unmapped languages
    pub qa_default: String,
    /// Language tag -> QA model
    pub qa_languages: BTreeMap<String, String>,
    pub summarization: String,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: docqa_common::VERSION.to_string(),
    })
}

/// Readiness probe - capabilities are built at startup, so a running
/// server reports the models it routes to
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let qa_languages = state
        .qa
        .languages()
        .into_iter()
        .map(|language| {
            let model = state.qa.route(&LanguageTag::new(language)).model_name().to_string();
            (language.to_string(), model)
        })
        .collect();

    Json(ReadyResponse {
        status: "ready".to_string(),
        provider: state.config.inference.provider.clone(),
        models: ModelReport {
            qa_default: state.qa.default_capability().model_name().to_string(),
            qa_languages,
            summarization: state
                .summarizers
                .default_capability()
                .model_name()
                .to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/v1/health").body(Body::empty()).unwrap();
        let (status, body) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_models() {
        let request = Request::get("/v1/ready").body(Body::empty()).unwrap();
        let (status, body) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "mock");
        assert_eq!(body["models"]["qa_default"], "deepset/xlm-roberta-large-squad2");
        assert_eq!(body["models"]["qa_languages"]["en"], "deepset/roberta-base-squad2");
        assert_eq!(body["models"]["summarization"], "csebuetnlp/mT5_multilingual_XLSum");
    }
}
