use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::models::submission::{ScrapeRequestBody, SubmitResponse, ValidationIssue};
use crate::routes::error::ApiError;

/// POST /scrape: validate a scrape request and queue it.
pub async fn submit_scrape(
    State(state): State<AppState>,
    body: Result<Json<ScrapeRequestBody>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        ApiError::Validation(vec![ValidationIssue::new("body", rejection.body_text())])
    })?;

    let request = body.into_request().map_err(ApiError::Validation)?;

    let job = state
        .queue
        .enqueue(request)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SubmitResponse {
        job_id: job.id,
        status: job.status,
        kind: job.kind,
        created_at: job.created_at,
    }))
}
