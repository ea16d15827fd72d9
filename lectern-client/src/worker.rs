//! Dispatch client (api -> worker)

use std::time::Duration;

use lectern_core::dto::job::{DispatchAccepted, DispatchJob};
use reqwest::Client;

use crate::error::{ClientError, Result};
use crate::handle_response;

/// Fire-and-forget dispatch of jobs to the worker
///
/// Every request carries a short timeout: the worker acknowledges with 202
/// before doing any processing, so a slow answer means it is unreachable.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    base_url: String,
    client: Client,
}

impl WorkerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /process
    pub async fn dispatch(&self, job: &DispatchJob) -> Result<DispatchAccepted> {
        let url = format!("{}/process", self.base_url);
        let response = self.client.post(&url).json(job).send().await?;

        handle_response(response).await
    }
}
