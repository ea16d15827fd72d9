//! Job intake endpoint
//!
//! Accepts a dispatched job, hands it to the executor and answers `202`
//! immediately. The outcome arrives later through the signed callback.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lectern_core::dto::error::{ErrorBody, codes};
use lectern_core::dto::job::{DispatchAccepted, DispatchJob};

use crate::api::WorkerState;

/// Rejected intake request
#[derive(Debug)]
pub struct IntakeError(String);

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0,
            code: codes::VALIDATION_ERROR.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Accept a job for background processing
/// POST /process
pub async fn accept_job(
    State(state): State<WorkerState>,
    payload: Result<Json<DispatchJob>, JsonRejection>,
) -> Result<(StatusCode, Json<DispatchAccepted>), IntakeError> {
    let Json(job) = payload.map_err(|e| IntakeError(e.body_text()))?;

    if job.job_id.is_nil() {
        return Err(IntakeError("job_id must not be nil".to_string()));
    }
    if job.input_reference.trim().is_empty() {
        return Err(IntakeError("input_reference must not be empty".to_string()));
    }

    tracing::info!(job_id = %job.job_id, "Accepted job for {}", job.input_reference);
    let job_id = job.job_id;
    state.executor.submit(job);

    Ok((
        StatusCode::ACCEPTED,
        Json(DispatchAccepted {
            job_id,
            status: "accepted".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::spawn_worker;
    use crate::service::ReporterService;
    use crate::service::reporter::ReportError;
    use async_trait::async_trait;
    use lectern_core::domain::job::{JobOptions, JobOutcome};
    use lectern_core::dto::callback::OutcomeReport;
    use lectern_storage::{ArtifactStore, ObjectArtifactStore};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    struct ChannelReporter(mpsc::UnboundedSender<OutcomeReport>);

    #[async_trait]
    impl ReporterService for ChannelReporter {
        async fn report(&self, report: &OutcomeReport) -> Result<(), ReportError> {
            let _ = self.0.send(report.clone());
            Ok(())
        }
    }

    async fn setup() -> (String, mpsc::UnboundedReceiver<OutcomeReport>) {
        let store = ObjectArtifactStore::in_memory();
        store
            .put("uploads/f.pdf", b"%PDF << /Type /Page >>".to_vec(), "application/pdf")
            .await
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let store: Arc<dyn ArtifactStore> = Arc::new(store);
        let base = spawn_worker(store, Arc::new(ChannelReporter(tx)), vec![]).await;
        (base, rx)
    }

    #[tokio::test]
    async fn test_accepts_and_reports_outcome() {
        let (base, mut rx) = setup().await;
        let job = DispatchJob {
            job_id: Uuid::new_v4(),
            input_reference: "uploads/f.pdf".to_string(),
            options: JobOptions::new(),
        };

        let response = reqwest::Client::new()
            .post(format!("{}/process", base))
            .json(&job)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 202);
        let accepted: DispatchAccepted = response.json().await.unwrap();
        assert_eq!(accepted.job_id, job.job_id);
        assert_eq!(accepted.status, "accepted");

        let report = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.job_id, job.job_id);
        assert!(matches!(report.outcome, JobOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_missing_input_still_reports_once() {
        let (base, mut rx) = setup().await;
        let job_id = Uuid::new_v4();

        let response = reqwest::Client::new()
            .post(format!("{}/process", base))
            .json(&serde_json::json!({"job_id": job_id, "input_reference": "uploads/gone.pdf"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 202);

        let report = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let JobOutcome::Failed { error } = report.outcome else {
            panic!("expected failed outcome");
        };
        assert_eq!(error.code, "INPUT_DOWNLOAD_ERROR");
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests() {
        let (base, _rx) = setup().await;
        let client = reqwest::Client::new();

        for body in [
            serde_json::json!({"job_id": Uuid::new_v4(), "input_reference": "  "}),
            serde_json::json!({"job_id": Uuid::nil(), "input_reference": "uploads/f.pdf"}),
            serde_json::json!({"input_reference": "uploads/f.pdf"}),
        ] {
            let response = client
                .post(format!("{}/process", base))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 400);
            let error: ErrorBody = response.json().await.unwrap();
            assert_eq!(error.code, codes::VALIDATION_ERROR);
        }
    }
}
