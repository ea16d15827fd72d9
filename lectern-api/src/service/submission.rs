//! Submission Service
//!
//! Turns a submit request into a billed, pending job and hands it to the
//! worker. Every rejection happens before the ledger is touched.

use lectern_core::domain::job::Job;
use lectern_core::dto::job::SubmitJob;
use lectern_storage::{ArtifactStore, StorageError};
use thiserror::Error;

use crate::repository::{Ledger, LedgerError, NewJob};
use crate::service::dispatch::{Dispatcher, dispatch_job};

pub const MAX_OWNER_LEN: usize = 320;
pub const MAX_INPUT_REFERENCE_LEN: usize = 1024;
pub const MAX_OPTIONS: usize = 32;
pub const MAX_OPTION_KEY_LEN: usize = 64;
pub const MAX_OPTION_VALUE_LEN: usize = 1024;

/// Service error type
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("account {owner} has insufficient credit")]
    InsufficientCredit { owner: String },

    #[error("input {0} does not exist in the artifact store")]
    InputReferenceMissing(String),

    #[error("artifact store error: {0}")]
    Storage(StorageError),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for SubmitError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(owner) => SubmitError::AccountNotFound(owner),
            LedgerError::InsufficientCredit { owner, .. } => SubmitError::InsufficientCredit { owner },
            other => SubmitError::Ledger(other),
        }
    }
}

impl From<StorageError> for SubmitError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey { key, reason } => {
                SubmitError::Validation(format!("input_reference '{}' is invalid: {}", key, reason))
            }
            other => SubmitError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SubmitError>;

/// Validate, debit one credit, create the job and dispatch it.
///
/// A dispatch failure does not fail the submission: the job stays pending
/// and can be re-sent with [`crate::service::recovery::redispatch`].
pub async fn submit_job(
    ledger: &dyn Ledger,
    store: &dyn ArtifactStore,
    dispatcher: &dyn Dispatcher,
    req: SubmitJob,
) -> Result<Job> {
    validate_submit_request(&req)?;

    if !store.exists(&req.input_reference).await? {
        return Err(SubmitError::InputReferenceMissing(req.input_reference));
    }

    let job = ledger
        .debit_and_create_job(NewJob {
            owner: req.owner,
            input_reference: req.input_reference,
            options: req.options,
        })
        .await?;

    tracing::info!(job_id = %job.id, owner = %job.owner, "Job created");

    // Outcome already logged and recorded by dispatch_job
    let _ = dispatch_job(ledger, dispatcher, &job).await;

    Ok(job)
}

fn validate_submit_request(req: &SubmitJob) -> Result<()> {
    if req.owner.trim().is_empty() {
        return Err(SubmitError::Validation("owner cannot be empty".to_string()));
    }
    if req.owner.len() > MAX_OWNER_LEN {
        return Err(SubmitError::Validation(format!(
            "owner exceeds {} characters",
            MAX_OWNER_LEN
        )));
    }
    if req.input_reference.trim().is_empty() {
        return Err(SubmitError::Validation(
            "input_reference cannot be empty".to_string(),
        ));
    }
    if req.input_reference.len() > MAX_INPUT_REFERENCE_LEN {
        return Err(SubmitError::Validation(format!(
            "input_reference exceeds {} characters",
            MAX_INPUT_REFERENCE_LEN
        )));
    }
    if req.options.len() > MAX_OPTIONS {
        return Err(SubmitError::Validation(format!(
            "at most {} options are allowed",
            MAX_OPTIONS
        )));
    }

    for (key, value) in &req.options {
        if key.is_empty() || key.len() > MAX_OPTION_KEY_LEN {
            return Err(SubmitError::Validation(format!(
                "option key '{}' must be 1..={} characters",
                key, MAX_OPTION_KEY_LEN
            )));
        }
        if value.len() > MAX_OPTION_VALUE_LEN {
            return Err(SubmitError::Validation(format!(
                "option '{}' exceeds {} characters",
                key, MAX_OPTION_VALUE_LEN
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryLedger;
    use crate::service::testing::RecordingDispatcher;
    use lectern_core::domain::event::kinds;
    use lectern_core::domain::job::{JobOptions, JobStatus};
    use lectern_storage::ObjectArtifactStore;

    async fn fixture(credits: i64) -> (InMemoryLedger, ObjectArtifactStore) {
        let ledger = InMemoryLedger::new();
        if credits > 0 {
            ledger.grant_credits("a@x.com", credits).await.unwrap();
        } else {
            ledger.create_account("a@x.com").await.unwrap();
        }
        let store = ObjectArtifactStore::in_memory();
        store
            .put("uploads/f.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();
        (ledger, store)
    }

    fn request() -> SubmitJob {
        SubmitJob {
            owner: "a@x.com".to_string(),
            input_reference: "uploads/f.pdf".to_string(),
            options: JobOptions::from([("language".to_string(), "English".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_submit_debits_and_dispatches() {
        let (ledger, store) = fixture(1).await;
        let dispatcher = RecordingDispatcher::accepting();

        let job = submit_job(&ledger, &store, &dispatcher, request()).await.unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(ledger.get_account("a@x.com").await.unwrap().unwrap().credits, 0);

        let sent = dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].job_id, job.id);
        assert_eq!(sent[0].input_reference, "uploads/f.pdf");
        assert_eq!(sent[0].options.get("language").map(String::as_str), Some("English"));
    }

    #[tokio::test]
    async fn test_insufficient_credit_creates_nothing() {
        let (ledger, store) = fixture(0).await;
        let dispatcher = RecordingDispatcher::accepting();

        let err = submit_job(&ledger, &store, &dispatcher, request()).await.unwrap_err();

        assert!(matches!(err, SubmitError::InsufficientCredit { .. }));
        assert!(dispatcher.sent().await.is_empty());
        assert!(ledger.list_pending(chrono::Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_is_rejected_before_debit() {
        let (ledger, store) = fixture(1).await;
        let dispatcher = RecordingDispatcher::accepting();
        let mut req = request();
        req.input_reference = "uploads/missing.pdf".to_string();

        let err = submit_job(&ledger, &store, &dispatcher, req).await.unwrap_err();

        assert!(matches!(err, SubmitError::InputReferenceMissing(key) if key == "uploads/missing.pdf"));
        assert_eq!(ledger.get_account("a@x.com").await.unwrap().unwrap().credits, 1);
    }

    #[tokio::test]
    async fn test_unknown_account_is_rejected() {
        let (ledger, store) = fixture(1).await;
        let dispatcher = RecordingDispatcher::accepting();
        let mut req = request();
        req.owner = "ghost@x.com".to_string();

        let err = submit_job(&ledger, &store, &dispatcher, req).await.unwrap_err();
        assert!(matches!(err, SubmitError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_job_pending_and_billed() {
        let (ledger, store) = fixture(1).await;
        let dispatcher = RecordingDispatcher::failing();

        let job = submit_job(&ledger, &store, &dispatcher, request()).await.unwrap();

        let stored = ledger.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(ledger.get_account("a@x.com").await.unwrap().unwrap().credits, 0);

        let seen: Vec<_> = ledger
            .list_events(job.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert!(seen.iter().any(|k| k == kinds::JOB_DISPATCH_FAILED));
    }

    #[test]
    fn test_validation_rules() {
        let mut req = request();
        req.owner = "  ".to_string();
        assert!(validate_submit_request(&req).is_err());

        let mut req = request();
        req.input_reference = String::new();
        assert!(validate_submit_request(&req).is_err());

        let mut req = request();
        req.options = (0..=MAX_OPTIONS)
            .map(|i| (format!("k{}", i), "v".to_string()))
            .collect();
        assert!(validate_submit_request(&req).is_err());

        let mut req = request();
        req.options = JobOptions::from([("".to_string(), "v".to_string())]);
        assert!(validate_submit_request(&req).is_err());

        assert!(validate_submit_request(&request()).is_ok());
    }
}
