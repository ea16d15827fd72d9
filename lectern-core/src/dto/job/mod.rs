//! Job DTOs for inter-service communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{Job, JobFailure, JobOptions, JobStatus, OutputManifest};

/// Request to submit a new job (client -> api)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJob {
    pub owner: String,
    pub input_reference: String,
    #[serde(default)]
    pub options: JobOptions,
}

/// Response to a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
}

/// Work order sent from the api to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchJob {
    pub job_id: Uuid,
    pub input_reference: String,
    #[serde(default)]
    pub options: JobOptions,
}

impl From<&Job> for DispatchJob {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            input_reference: job.input_reference.clone(),
            options: job.options.clone(),
        }
    }
}

/// Worker acknowledgement of a dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAccepted {
    pub job_id: Uuid,
    pub status: String,
}

/// Read-only projection of a job returned to pollers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(default)]
    pub outputs: Option<OutputManifest>,
    #[serde(default)]
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            outputs: job.outputs,
            error: job.error,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Summary row for operational listings (stale pending jobs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: Uuid,
    pub owner: String,
    pub input_reference: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for JobSummary {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            owner: job.owner,
            input_reference: job.input_reference,
            status: job.status,
            created_at: job.created_at,
        }
    }
}
