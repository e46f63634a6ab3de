use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::job::Job;
use crate::models::scrape::ScrapeResults;
use crate::routes::error::ApiError;

// Malformed ids are simply unknown jobs.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// GET /jobs/{job_id}: full stored job record.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let id = parse_id(&job_id).ok_or(ApiError::NotFound("Job not found"))?;
    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Job not found"))
}

/// GET /jobs/{job_id}/results: results of a completed job.
pub async fn get_job_results(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ScrapeResults>, ApiError> {
    let id = parse_id(&job_id).ok_or(ApiError::NotFound("Results not found"))?;
    state
        .store
        .get(id)
        .await
        .and_then(|job| job.results)
        .map(Json)
        .ok_or(ApiError::NotFound("Results not found"))
}
