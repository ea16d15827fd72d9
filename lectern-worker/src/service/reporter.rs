//! Outcome reporting
//!
//! Delivers the final [`OutcomeReport`] of a job to the api. When callback
//! settings are missing the report cannot be delivered; the job stays
//! pending on the api side and the failure is logged here.

use async_trait::async_trait;
use lectern_client::{CallbackClient, ClientError};
use lectern_core::dto::callback::OutcomeReport;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("callback is not configured (missing: {0})")]
    NotConfigured(String),

    #[error("callback delivery failed: {0}")]
    Delivery(#[from] ClientError),
}

/// Service trait for delivering outcome reports
#[async_trait]
pub trait ReporterService: Send + Sync {
    async fn report(&self, report: &OutcomeReport) -> Result<(), ReportError>;
}

/// Signs reports and posts them to the api callback endpoint
pub struct CallbackReporter {
    client: CallbackClient,
}

impl CallbackReporter {
    pub fn new(client: CallbackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReporterService for CallbackReporter {
    async fn report(&self, report: &OutcomeReport) -> Result<(), ReportError> {
        self.client.report(report).await?;
        Ok(())
    }
}

/// Stand-in used while the callback URL or secret is missing
pub struct UnconfiguredReporter {
    missing: Vec<&'static str>,
}

impl UnconfiguredReporter {
    pub fn new(missing: Vec<&'static str>) -> Self {
        Self { missing }
    }
}

#[async_trait]
impl ReporterService for UnconfiguredReporter {
    async fn report(&self, report: &OutcomeReport) -> Result<(), ReportError> {
        let missing = self.missing.join(", ");
        error!(
            job_id = %report.job_id,
            "Cannot deliver outcome, callback settings missing: {}",
            missing
        );
        Err(ReportError::NotConfigured(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::domain::job::JobOutcome;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unconfigured_reporter_names_missing_settings() {
        let reporter = UnconfiguredReporter::new(vec!["WORKER_CALLBACK_URL", "WORKER_CALLBACK_SECRET"]);
        let report = OutcomeReport {
            job_id: Uuid::new_v4(),
            outcome: JobOutcome::failed("PROCESSING_ERROR", "boom"),
        };

        let err = reporter.report(&report).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "callback is not configured (missing: WORKER_CALLBACK_URL, WORKER_CALLBACK_SECRET)"
        );
    }
}
