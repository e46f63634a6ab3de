use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;
use crate::services::job_store::StatusCounts;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub worker_running: bool,
    pub queue_depth: usize,
    pub jobs: StatusCounts,
}

/// GET /health: liveness plus worker and queue status. No authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        worker_running: state.queue.is_running(),
        queue_depth: state.queue.queue_depth(),
        jobs: state.store.counts().await,
    })
}
