//! DocQA API Gateway
//!
//! HTTP entry point for document question answering.
//! Handles:
//! - Question answering over long documents (JSON text or uploaded files)
//! - Summarization and language detection
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use docqa_common::{
    config::AppConfig,
    errors::Result,
    inference::{create_summarizer, QaCapability, Summarizer},
    language::{build_qa_router, CapabilityRouter, LanguageDetector, ScriptDetector},
    metrics,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub detector: Arc<dyn LanguageDetector>,
    pub qa: CapabilityRouter<dyn QaCapability>,
    pub summarizers: CapabilityRouter<dyn Summarizer>,
}

impl AppState {
    /// Build every model capability once; failures here are fatal
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let qa = build_qa_router(&config.inference)?;
        let summarizers = CapabilityRouter::new(create_summarizer(&config.inference)?);

        Ok(Self {
            config: Arc::new(config),
            detector: Arc::new(ScriptDetector::default()),
            qa,
            summarizers,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.observability.log_level))
        .context("invalid observability.log_level")?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(
        service = %config.observability.service_name,
        "Starting DocQA API Gateway v{}",
        docqa_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::INFERENCE_BUCKETS,
            )?
            .install()
            .context("failed to install Prometheus exporter")?;
        metrics::register_metrics();
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Build model capabilities
    info!(
        provider = %config.inference.provider,
        qa_model = %config.inference.qa_default_model,
        summarization_model = %config.inference.summarization_model,
        "Loading inference capabilities"
    );
    let state = AppState::from_config(config)?;
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("invalid server.host / server.port")?;

    // Build the router
    let app = create_router(state)?;

    // Start the server
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Result<Router> {
    let config = Arc::clone(&state.config);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let mut api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Question answering
        .route("/ask", post(handlers::ask::ask))
        .route("/ask/document", post(handlers::ask::ask_document))

        // Summarization
        .route("/summarize", post(handlers::summarize::summarize))

        // Language detection
        .route("/detect-language", post(handlers::language::detect_language))
        .route_layer(from_fn(middleware::metrics::track_metrics));

    if config.rate_limit.enabled {
        let limit = middleware::rate_limit::RateLimit::new(
            config.rate_limit.requests_per_second,
            config.rate_limit.burst,
        )?;
        api_routes = api_routes.layer(from_fn_with_state(
            limit,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    // Compose the app
    Ok(Router::new()
        .nest("/v1", api_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// Mock-backed app with rate limiting off
    pub fn test_app() -> Router {
        test_app_with(AppConfig::default())
    }

    pub fn test_app_with(mut config: AppConfig) -> Router {
        config.rate_limit.enabled = false;
        create_router(AppState::from_config(config).unwrap()).unwrap()
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let request = Request::get("/v1/papers").body(Body::empty()).unwrap();
        let (status, _) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limit_applies() {
        let mut config = AppConfig::default();
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
        let app = create_router(AppState::from_config(config).unwrap()).unwrap();

        let first = Request::get("/v1/health").body(Body::empty()).unwrap();
        let (status, _) = send(app.clone(), first).await;
        assert_eq!(status, StatusCode::OK);

        let second = Request::get("/v1/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, second).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        use docqa_common::inference::ScriptedQa;
        use std::time::Duration;

        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.server.request_timeout_secs = 1;

        let mut state = AppState::from_config(config).unwrap();
        let slow: Arc<dyn QaCapability> = Arc::new(
            ScriptedQa::new("slow")
                .with_answer("Lisbon", "Lisbon", 0.9)
                .with_delay("Lisbon", Duration::from_secs(10)),
        );
        state.qa = CapabilityRouter::new(slow);

        let request = post_json(
            "/v1/ask",
            serde_json::json!({ "question": "Where?", "text": "Lisbon" }),
        );
        let (status, _) = send(create_router(state).unwrap(), request).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_invalid_config_rejected_at_startup() {
        let mut config = AppConfig::default();
        config.chunking.stride = config.chunking.max_tokens;
        assert!(AppState::from_config(config).is_err());
    }
}
