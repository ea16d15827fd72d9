//! Recovery Service
//!
//! Operator tools for jobs that never reached the worker: list pending jobs
//! past an age threshold and re-send a stored job. Nothing here runs on a
//! timer.

use std::time::Duration;

use chrono::Utc;
use lectern_core::domain::event::kinds;
use lectern_core::domain::job::Job;
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{Ledger, LedgerError};
use crate::service::dispatch::{DispatchError, Dispatcher, dispatch_job};

/// Service error type
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    InvalidState(String),

    #[error("threshold out of range: {0}")]
    InvalidThreshold(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, RecoveryError>;

/// Pending jobs created more than `older_than` ago, oldest first
pub async fn list_stale(ledger: &dyn Ledger, older_than: Duration) -> Result<Vec<Job>> {
    let older_than = chrono::Duration::from_std(older_than)
        .map_err(|e| RecoveryError::InvalidThreshold(e.to_string()))?;
    let cutoff = Utc::now()
        .checked_sub_signed(older_than)
        .ok_or_else(|| RecoveryError::InvalidThreshold("cutoff before epoch".to_string()))?;

    let jobs = ledger.list_pending(cutoff).await?;
    tracing::debug!("{} stale pending job(s)", jobs.len());
    Ok(jobs)
}

/// Re-send a pending job to the worker using its stored record.
///
/// Terminal jobs are refused. The worker may process the job twice if the
/// first dispatch did arrive; the callback guard keeps the outcome single.
pub async fn redispatch(ledger: &dyn Ledger, dispatcher: &dyn Dispatcher, job_id: Uuid) -> Result<Job> {
    let job = ledger
        .get_job(job_id)
        .await?
        .ok_or(RecoveryError::NotFound(job_id))?;

    if job.status.is_terminal() {
        return Err(RecoveryError::InvalidState(format!(
            "Job {} is already {}",
            job_id, job.status
        )));
    }

    dispatch_job(ledger, dispatcher, &job).await?;

    ledger
        .append_event(kinds::JOB_REDISPATCHED, serde_json::json!({ "job_id": job.id }))
        .await?;

    tracing::info!(job_id = %job.id, "Job redispatched");
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryLedger, NewJob};
    use crate::service::testing::RecordingDispatcher;
    use lectern_core::domain::job::{JobOptions, JobOutcome};

    async fn ledger_with_job() -> (InMemoryLedger, Job) {
        let ledger = InMemoryLedger::new();
        ledger.grant_credits("a@x.com", 1).await.unwrap();
        let job = ledger
            .debit_and_create_job(NewJob {
                owner: "a@x.com".to_string(),
                input_reference: "uploads/f.pdf".to_string(),
                options: JobOptions::from([("language".to_string(), "German".to_string())]),
            })
            .await
            .unwrap();
        (ledger, job)
    }

    #[tokio::test]
    async fn test_redispatch_resends_stored_record() {
        let (ledger, job) = ledger_with_job().await;
        let dispatcher = RecordingDispatcher::accepting();

        redispatch(&ledger, &dispatcher, job.id).await.unwrap();

        let sent = dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].job_id, job.id);
        assert_eq!(sent[0].options, job.options);
    }

    #[tokio::test]
    async fn test_redispatch_refuses_terminal_jobs() {
        let (ledger, job) = ledger_with_job().await;
        ledger
            .record_outcome(job.id, JobOutcome::failed("EMPTY_INPUT", "no pages"), Utc::now())
            .await
            .unwrap();
        let dispatcher = RecordingDispatcher::accepting();

        let err = redispatch(&ledger, &dispatcher, job.id).await.unwrap_err();

        assert!(matches!(err, RecoveryError::InvalidState(_)));
        assert!(dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_redispatch_surfaces_worker_failure() {
        let (ledger, job) = ledger_with_job().await;
        let err = redispatch(&ledger, &RecordingDispatcher::failing(), job.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RecoveryError::Dispatch(_)));
    }

    #[tokio::test]
    async fn test_redispatch_unknown_job() {
        let ledger = InMemoryLedger::new();
        let err = redispatch(&ledger, &RecordingDispatcher::accepting(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, RecoveryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_stale_respects_threshold() {
        let (ledger, job) = ledger_with_job().await;

        let fresh = list_stale(&ledger, Duration::from_secs(900)).await.unwrap();
        assert!(fresh.is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let stale = list_stale(&ledger, Duration::from_millis(5)).await.unwrap();
        assert_eq!(stale.iter().map(|j| j.id).collect::<Vec<_>>(), vec![job.id]);
    }
}
