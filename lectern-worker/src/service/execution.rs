//! Execution service
//!
//! Runs one dispatched job end to end:
//! - Download the input document from the artifact store
//! - Transform it into study material
//! - Render and upload the artifacts under `outputs/{job_id}/`
//! - Presign the uploads and collect them into an output manifest
//!
//! Every execution ends in exactly one [`OutcomeReport`]; failures at any
//! step become a `failed` outcome carrying a machine code.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lectern_core::domain::job::{JobOutcome, OutputManifest, error_codes};
use lectern_core::dto::callback::OutcomeReport;
use lectern_core::dto::job::DispatchJob;
use lectern_storage::{ArtifactStore, StorageError, output_key};
use thiserror::Error;
use tracing::{debug, error, info};

use super::render::render_all;
use super::transform::{TransformError, TransformRequest, Transformer};

/// Manifest entry holding the section count
pub const TOTAL_SLIDES_KEY: &str = "total_slides";

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to download input '{key}': {source}")]
    Download { key: String, source: StorageError },

    #[error("input '{0}' is empty")]
    EmptyInput(String),

    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),

    #[error("failed to render artifacts: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to store artifact '{key}': {source}")]
    Upload { key: String, source: StorageError },
}

impl ExecutionError {
    /// Machine code reported in the failed outcome
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionError::Download { .. } => error_codes::INPUT_DOWNLOAD_ERROR,
            ExecutionError::EmptyInput(_) => error_codes::EMPTY_INPUT,
            ExecutionError::Transform(_) => error_codes::TRANSFORM_ERROR,
            ExecutionError::Upload { .. } => error_codes::ARTIFACT_UPLOAD_ERROR,
            ExecutionError::Render(_) => error_codes::PROCESSING_ERROR,
        }
    }
}

/// Service trait for executing dispatched jobs
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Process `job` and describe how it ended
    ///
    /// Never fails: errors are folded into a `failed` outcome.
    async fn execute(&self, job: &DispatchJob) -> OutcomeReport;
}

/// Standard implementation of ExecutionService
pub struct StandardExecutionService {
    store: Arc<dyn ArtifactStore>,
    transformer: Arc<dyn Transformer>,
    presign_ttl: Duration,
}

impl StandardExecutionService {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        transformer: Arc<dyn Transformer>,
        presign_ttl: Duration,
    ) -> Self {
        Self {
            store,
            transformer,
            presign_ttl,
        }
    }

    /// Produce and publish the artifacts for `job`
    pub async fn process(&self, job: &DispatchJob) -> Result<OutputManifest, ExecutionError> {
        let input = self
            .store
            .get(&job.input_reference)
            .await
            .map_err(|source| ExecutionError::Download {
                key: job.input_reference.clone(),
                source,
            })?;
        if input.is_empty() {
            return Err(ExecutionError::EmptyInput(job.input_reference.clone()));
        }
        debug!(job_id = %job.job_id, "Downloaded {} bytes of input", input.len());

        let request = TransformRequest::new(&input, &job.options);
        info!(job_id = %job.job_id, language = request.language, "Transforming input");
        let material = self.transformer.transform(request).await?;
        info!(
            job_id = %job.job_id,
            "Transformation produced {} section(s)",
            material.sections.len()
        );

        let mut manifest = OutputManifest::new();
        for artifact in render_all(&material)? {
            let key = output_key(job.job_id, artifact.file_name);
            let upload = |source| ExecutionError::Upload {
                key: key.clone(),
                source,
            };

            self.store
                .put(&key, artifact.bytes, artifact.content_type)
                .await
                .map_err(upload)?;
            let url = self
                .store
                .presign(&key, self.presign_ttl)
                .await
                .map_err(upload)?;

            manifest.insert(artifact.manifest_key.to_string(), url);
        }
        manifest.insert(
            TOTAL_SLIDES_KEY.to_string(),
            material.sections.len().to_string(),
        );

        Ok(manifest)
    }
}

#[async_trait]
impl ExecutionService for StandardExecutionService {
    async fn execute(&self, job: &DispatchJob) -> OutcomeReport {
        let outcome = match self.process(job).await {
            Ok(outputs) => {
                info!(job_id = %job.job_id, "Job completed with {} output(s)", outputs.len());
                JobOutcome::Completed { outputs }
            }
            Err(e) => {
                error!(job_id = %job.job_id, code = e.code(), "Job failed: {}", e);
                JobOutcome::failed(e.code(), e.to_string())
            }
        };

        OutcomeReport {
            job_id: job.job_id,
            outcome,
        }
    }
}
