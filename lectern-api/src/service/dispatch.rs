//! Dispatch to the worker
//!
//! Dispatch is fire-and-forget: a failed or timed-out call leaves the job
//! pending and is recorded as an event, never as a job failure.

use async_trait::async_trait;
use lectern_client::WorkerClient;
use lectern_core::domain::event::kinds;
use lectern_core::domain::job::Job;
use lectern_core::dto::job::DispatchJob;
use thiserror::Error;

use crate::repository::Ledger;

#[derive(Debug, Error)]
#[error("dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Hands a job to the worker without waiting for processing
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, job: &DispatchJob) -> Result<(), DispatchError>;
}

/// [`Dispatcher`] posting to the worker's `/process` endpoint
pub struct HttpDispatcher {
    client: WorkerClient,
}

impl HttpDispatcher {
    pub fn new(client: WorkerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, job: &DispatchJob) -> Result<(), DispatchError> {
        let accepted = self
            .client
            .dispatch(job)
            .await
            .map_err(|e| DispatchError(e.to_string()))?;

        tracing::debug!(job_id = %accepted.job_id, "Worker acknowledged dispatch: {}", accepted.status);
        Ok(())
    }
}

/// Dispatch `job`, recording a `job.dispatch_failed` event on failure.
///
/// Returns the dispatch error so callers can decide whether to surface it;
/// the job itself is never modified.
pub async fn dispatch_job(
    ledger: &dyn Ledger,
    dispatcher: &dyn Dispatcher,
    job: &Job,
) -> Result<(), DispatchError> {
    let order = DispatchJob::from(job);

    match dispatcher.dispatch(&order).await {
        Ok(()) => {
            tracing::info!(job_id = %job.id, "Job dispatched to worker");
            Ok(())
        }
        Err(err) => {
            tracing::warn!(job_id = %job.id, "Job left pending: {}", err);

            let payload = serde_json::json!({
                "job_id": job.id,
                "reason": err.to_string(),
            });
            if let Err(e) = ledger.append_event(kinds::JOB_DISPATCH_FAILED, payload).await {
                tracing::error!(job_id = %job.id, "Failed to record dispatch failure: {}", e);
            }
            Err(err)
        }
    }
}
