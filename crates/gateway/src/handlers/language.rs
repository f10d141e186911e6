//! Language detection handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation_error;
use crate::AppState;
use docqa_common::{errors::Result, language::LanguageTag};

#[derive(Debug, Deserialize, Validate)]
pub struct DetectLanguageRequest {
    #[validate(length(max = 1_000_000))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetectLanguageResponse {
    pub language: LanguageTag,
    pub confidence: f32,
}

/// Detect the language of a text; undetectable text is `unknown`, not an error
pub async fn detect_language(
    State(state): State<AppState>,
    Json(request): Json<DetectLanguageRequest>,
) -> Result<Json<DetectLanguageResponse>> {
    request.validate().map_err(validation_error)?;

    let detection = state.detector.detect_with_confidence(&request.text);
    Ok(Json(DetectLanguageResponse {
        language: detection.language,
        confidence: detection.confidence,
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_detect_language() {
        let request = post_json(
            "/v1/detect-language",
            json!({ "text": "Le chien est dans le jardin avec les enfants." }),
        );
        let (status, body) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "fr");
        assert!(body["confidence"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_detect_language_unknown() {
        let request = post_json("/v1/detect-language", json!({ "text": "" }));
        let (status, body) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "unknown");
        assert_eq!(body["confidence"], 0.0);
    }
}
