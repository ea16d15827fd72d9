//! Callback Service
//!
//! Receives outcome reports from the worker. The signature over the raw body
//! is checked first; nothing is parsed or looked up for an unauthenticated
//! report.

use chrono::Utc;
use lectern_core::domain::job::{Job, JobOutcome};
use lectern_core::dto::callback::OutcomeReport;
use lectern_core::signature::{CallbackSecret, SignatureError};
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{Ledger, LedgerError, OutcomeApplied};

/// Service error type
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("invalid signature: {0}")]
    InvalidSignature(SignatureError),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("job {0} not found")]
    UnknownJob(Uuid),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for CallbackError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownJob(id) => CallbackError::UnknownJob(id),
            other => CallbackError::Ledger(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CallbackError>;

/// Authenticate and apply an outcome report.
///
/// A report for an already-terminal job succeeds without changing it, so
/// the worker may retry delivery freely.
pub async fn receive_outcome(
    ledger: &dyn Ledger,
    secret: &CallbackSecret,
    body: &[u8],
    signature: Option<&str>,
) -> Result<Job> {
    secret.verify(body, signature).map_err(|e| {
        tracing::warn!("Rejected outcome report: {}", e);
        CallbackError::InvalidSignature(e)
    })?;

    let report: OutcomeReport = serde_json::from_slice(body)
        .map_err(|e| CallbackError::MalformedPayload(e.to_string()))?;
    let outcome = report.outcome.normalized();
    validate_outcome(&outcome)?;

    let applied = ledger
        .record_outcome(report.job_id, outcome, Utc::now())
        .await?;

    match applied {
        OutcomeApplied::Applied(job) => {
            tracing::info!(job_id = %job.id, status = %job.status, "Job outcome recorded");
            Ok(job)
        }
        OutcomeApplied::AlreadyTerminal(job) => {
            tracing::info!(job_id = %job.id, status = %job.status, "Duplicate outcome ignored");
            Ok(job)
        }
    }
}

/// Most artifacts a completed report may list
pub const MAX_OUTPUTS: usize = 32;
pub const MAX_OUTPUT_KIND_LEN: usize = 64;
pub const MAX_OUTPUT_REFERENCE_LEN: usize = 4096;

fn validate_outcome(outcome: &JobOutcome) -> Result<()> {
    match outcome {
        JobOutcome::Failed { error } => {
            if error.code.trim().is_empty() {
                return Err(CallbackError::MalformedPayload(
                    "error.code cannot be empty".to_string(),
                ));
            }
        }
        JobOutcome::Completed { outputs } => {
            if outputs.len() > MAX_OUTPUTS {
                return Err(CallbackError::MalformedPayload(format!(
                    "outputs cannot list more than {} artifacts",
                    MAX_OUTPUTS
                )));
            }
            for (kind, reference) in outputs {
                if kind.trim().is_empty() || kind.chars().count() > MAX_OUTPUT_KIND_LEN {
                    return Err(CallbackError::MalformedPayload(format!(
                        "output kind must be 1-{} characters",
                        MAX_OUTPUT_KIND_LEN
                    )));
                }
                if reference.chars().count() > MAX_OUTPUT_REFERENCE_LEN {
                    return Err(CallbackError::MalformedPayload(format!(
                        "output '{}' exceeds {} characters",
                        kind, MAX_OUTPUT_REFERENCE_LEN
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryLedger, NewJob};
    use lectern_core::domain::job::{JobOptions, JobStatus, OutputManifest};

    fn secret() -> CallbackSecret {
        CallbackSecret::new("worker-secret").unwrap()
    }

    async fn pending_job(ledger: &InMemoryLedger) -> Job {
        ledger.grant_credits("a@x.com", 1).await.unwrap();
        ledger
            .debit_and_create_job(NewJob {
                owner: "a@x.com".to_string(),
                input_reference: "uploads/f.pdf".to_string(),
                options: JobOptions::new(),
            })
            .await
            .unwrap()
    }

    fn completed_body(job_id: Uuid) -> Vec<u8> {
        serde_json::to_vec(&OutcomeReport {
            job_id,
            outcome: JobOutcome::Completed {
                outputs: OutputManifest::from([
                    ("summary_json_url".to_string(), "https://s3/summary".to_string()),
                    ("docx_url".to_string(), "https://s3/docx".to_string()),
                ]),
            },
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_signed_report_completes_job() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;
        let body = completed_body(job.id);
        let sig = secret().sign(&body).unwrap();

        let done = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.outputs.as_ref().unwrap().len(), 2);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_replayed_report_returns_same_record() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;
        let body = completed_body(job.id);
        let sig = secret().sign(&body).unwrap();

        let first = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap();
        let second = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.list_events(job.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_signature_changes_nothing() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;
        let body = completed_body(job.id);
        let forged = CallbackSecret::new("attacker").unwrap().sign(&body).unwrap();

        for signature in [None, Some("zz"), Some(forged.as_str())] {
            let err = receive_outcome(&ledger, &secret(), &body, signature)
                .await
                .unwrap_err();
            assert!(matches!(err, CallbackError::InvalidSignature(_)));
        }

        assert_eq!(ledger.get_job(job.id).await.unwrap(), Some(job));
    }

    #[tokio::test]
    async fn test_bad_signature_on_terminal_job_is_still_rejected() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;
        let body = completed_body(job.id);
        let sig = secret().sign(&body).unwrap();
        let done = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap();

        let err = receive_outcome(&ledger, &secret(), &body, None).await.unwrap_err();

        assert!(matches!(err, CallbackError::InvalidSignature(SignatureError::Missing)));
        assert_eq!(ledger.get_job(job.id).await.unwrap(), Some(done));
    }

    #[tokio::test]
    async fn test_unknown_job_is_distinct_error() {
        let ledger = InMemoryLedger::new();
        let missing = Uuid::new_v4();
        let body = completed_body(missing);
        let sig = secret().sign(&body).unwrap();

        let err = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap_err();

        assert!(matches!(err, CallbackError::UnknownJob(id) if id == missing));
        assert!(ledger.get_job(missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;

        for body in [
            b"not json".to_vec(),
            serde_json::to_vec(&serde_json::json!({"job_id": job.id, "status": "running"})).unwrap(),
            serde_json::to_vec(&serde_json::json!({
                "job_id": job.id,
                "status": "failed",
                "error": {"message": "boom", "code": ""}
            }))
            .unwrap(),
        ] {
            let sig = secret().sign(&body).unwrap();
            let err = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap_err();
            assert!(matches!(err, CallbackError::MalformedPayload(_)));
        }

        assert_eq!(ledger.get_job(job.id).await.unwrap(), Some(job));
    }

    fn signed(body: &serde_json::Value) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(body).unwrap();
        let sig = secret().sign(&body).unwrap();
        (body, sig)
    }

    #[tokio::test]
    async fn test_oversized_failure_still_fails_job() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;
        let (body, sig) = signed(&serde_json::json!({
            "job_id": job.id,
            "status": "failed",
            "error": {
                "code": "X".repeat(65),
                "message": format!("vision API error\u{0}{}", "e".repeat(64 * 1024)),
            }
        }));

        let failed = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap();

        assert_eq!(failed.status, JobStatus::Failed);
        let error = failed.error.as_ref().unwrap();
        assert_eq!(error.code, "X".repeat(64));
        assert!(error.message.starts_with("vision API error"));
        assert!(!error.message.contains('\0'));
        assert!(error.message.chars().count() <= 4096);
        assert!(failed.is_consistent());
    }

    #[tokio::test]
    async fn test_nul_only_code_is_malformed() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;
        let (body, sig) = signed(&serde_json::json!({
            "job_id": job.id,
            "status": "failed",
            "error": {"code": "\u{0}", "message": "boom"}
        }));

        let err = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap_err();

        assert!(matches!(err, CallbackError::MalformedPayload(_)));
        assert_eq!(ledger.get_job(job.id).await.unwrap(), Some(job));
    }

    #[tokio::test]
    async fn test_oversized_manifest_is_malformed() {
        let ledger = InMemoryLedger::new();
        let job = pending_job(&ledger).await;

        let too_many: OutputManifest = (0..=MAX_OUTPUTS)
            .map(|i| (format!("artifact_{}", i), "https://s3/x".to_string()))
            .collect();
        let too_long =
            OutputManifest::from([("docx_url".to_string(), "h".repeat(MAX_OUTPUT_REFERENCE_LEN + 1))]);

        for outputs in [too_many, too_long] {
            let (body, sig) = signed(&serde_json::json!({
                "job_id": job.id,
                "status": "completed",
                "outputs": outputs,
            }));
            let err = receive_outcome(&ledger, &secret(), &body, Some(&sig)).await.unwrap_err();
            assert!(matches!(err, CallbackError::MalformedPayload(_)));
        }

        assert_eq!(ledger.get_job(job.id).await.unwrap(), Some(job));
    }
}
