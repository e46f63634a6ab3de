pub mod error;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod scrape;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::routes::error::ApiError;
use crate::services::webhook;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

const KEY_CHECK_DOMAIN: &str = "lead-scraper/api-key";

/// Build the HTTP router. Everything except `/health` sits behind the bearer check,
/// including unmatched paths.
pub fn create_router(state: AppState, metrics: Option<Arc<PrometheusHandle>>) -> Router {
    let mut protected = Router::new()
        .route("/scrape", post(scrape::submit_scrape))
        .route("/jobs/{job_id}", get(jobs::get_job))
        .route("/jobs/{job_id}/results", get(jobs::get_job_results));

    if let Some(handle) = metrics {
        protected = protected.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(handle),
        );
    }

    protected
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if !state.api_key.is_empty() && key_matches(token, &state.api_key) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Constant-time comparison of a presented bearer token with the configured key.
fn key_matches(presented: &str, expected: &str) -> bool {
    // Equal-length digests on both sides, compared in constant time.
    let expected_tag = webhook::sign(KEY_CHECK_DOMAIN, expected.as_bytes());
    webhook::verify_signature(KEY_CHECK_DOMAIN, presented.as_bytes(), &expected_tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_only_exact_token() {
        assert!(key_matches("s3cret-key", "s3cret-key"));
        assert!(!key_matches("s3cret-kez", "s3cret-key"));
        assert!(!key_matches("s3cret", "s3cret-key"));
        assert!(!key_matches("s3cret-key-extra", "s3cret-key"));
        assert!(!key_matches("", "s3cret-key"));
    }
}
