//! Job-related api endpoints

use std::time::Duration;

use lectern_core::dto::job::{DispatchAccepted, JobSummary, JobView, SubmitJob, SubmitJobResponse};
use uuid::Uuid;

use crate::ApiClient;
use crate::error::Result;
use crate::{handle_empty_response, handle_response};

/// Shortest pause between two polls of [`ApiClient::wait_for_job`]
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of polling a job with a bounded timeout
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The job reached `completed` or `failed`
    Finished(JobView),
    /// The window elapsed first; carries the last observed view
    TimedOut(JobView),
}

impl ApiClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a job, consuming one credit of `req.owner`
    ///
    /// Insufficient credit surfaces as a 402 [`crate::ClientError::ApiError`];
    /// check it with [`crate::ClientError::is_insufficient_credit`].
    pub async fn submit_job(&self, req: &SubmitJob) -> Result<SubmitJobResponse> {
        let url = format!("{}/jobs", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        handle_response(response).await
    }

    /// Get the current projection of a job
    pub async fn get_job(&self, job_id: Uuid) -> Result<JobView> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    /// Poll a job until it is terminal or `timeout` elapses
    ///
    /// `interval` is raised to [`MIN_POLL_INTERVAL`].
    pub async fn wait_for_job(
        &self,
        job_id: Uuid,
        timeout: Duration,
        interval: Duration,
    ) -> Result<WaitOutcome> {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let view = self.get_job(job_id).await?;
            if view.status.is_terminal() {
                return Ok(WaitOutcome::Finished(view));
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                tracing::debug!("Gave up waiting for job {} after {:?}", job_id, timeout);
                return Ok(WaitOutcome::TimedOut(view));
            }

            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    // =============================================================================
    // Operational Recovery
    // =============================================================================

    /// List jobs still pending after `older_than`
    pub async fn list_stale_jobs(&self, older_than: Duration) -> Result<Vec<JobSummary>> {
        let url = format!("{}/jobs/stale", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("older_than_secs", older_than.as_secs())])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Re-send a pending job to the worker
    pub async fn redispatch_job(&self, job_id: Uuid) -> Result<DispatchAccepted> {
        let url = format!("{}/jobs/{}/dispatch", self.base_url, job_id);
        let response = self.client.post(&url).send().await?;

        handle_response(response).await
    }

    /// Check api liveness
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        handle_empty_response(response).await
    }
}
