//! Job API Handlers
//!
//! Submission, status polling and operator recovery endpoints.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use lectern_core::dto::job::{DispatchAccepted, JobSummary, JobView, SubmitJob, SubmitJobResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::service::{recovery_service, status_service, submission_service};
use crate::state::AppState;

/// Default age after which a pending job counts as stale
pub const DEFAULT_STALE_AFTER_SECS: u64 = 900;

// =============================================================================
// Job Lifecycle Endpoints
// =============================================================================

/// POST /jobs
/// Debit one credit, create a pending job and dispatch it
pub async fn submit_job(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    tracing::info!("Submitting job for {}", req.owner);

    let job = submission_service::submit_job(
        state.ledger.as_ref(),
        state.store.as_ref(),
        state.dispatcher.as_ref(),
        req,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(SubmitJobResponse { job_id: job.id })))
}

/// GET /jobs/{id}
/// Current projection of a job
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobView>> {
    let id = parse_job_id(&id)?;
    tracing::debug!("Getting job: {}", id);

    let view = status_service::get_job_view(state.ledger.as_ref(), id).await?;
    Ok(Json(view))
}

// =============================================================================
// Recovery Endpoints
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StaleJobsQuery {
    pub older_than_secs: Option<u64>,
}

/// GET /jobs/stale?older_than_secs=N
/// Pending jobs older than the threshold
pub async fn list_stale_jobs(
    State(state): State<AppState>,
    Query(params): Query<StaleJobsQuery>,
) -> ApiResult<Json<Vec<JobSummary>>> {
    let secs = params.older_than_secs.unwrap_or(DEFAULT_STALE_AFTER_SECS);
    tracing::debug!("Listing jobs pending for more than {}s", secs);

    let jobs = recovery_service::list_stale(state.ledger.as_ref(), Duration::from_secs(secs)).await?;
    Ok(Json(jobs.into_iter().map(JobSummary::from).collect()))
}

/// POST /jobs/{id}/dispatch
/// Re-send a pending job to the worker
pub async fn redispatch_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<DispatchAccepted>)> {
    let id = parse_job_id(&id)?;
    tracing::info!("Redispatching job: {}", id);

    let job =
        recovery_service::redispatch(state.ledger.as_ref(), state.dispatcher.as_ref(), id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DispatchAccepted {
            job_id: job.id,
            status: "dispatched".to_string(),
        }),
    ))
}

fn parse_job_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("Invalid job id: {}", raw)))
}
