//! Job domain types

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mapping from artifact kind to a retrieval reference (usually a presigned URL)
pub type OutputManifest = HashMap<String, String>;

/// Free-form processing options forwarded to the executor (e.g. `language`)
pub type JobOptions = HashMap<String, String>;

/// One submitted conversion request and its lifecycle record
///
/// Created `Pending` together with the credit debit, then moved exactly once
/// to `Completed` or `Failed` by an authenticated outcome report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub owner: String,
    pub input_reference: String,
    pub options: JobOptions,
    pub status: JobStatus,
    pub outputs: Option<OutputManifest>,
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Build a fresh pending job with a newly generated identifier
    pub fn new_pending(
        owner: impl Into<String>,
        input_reference: impl Into<String>,
        options: JobOptions,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            input_reference: input_reference.into(),
            options,
            status: JobStatus::Pending,
            outputs: None,
            error: None,
            created_at,
            completed_at: None,
        }
    }

    /// Apply a terminal outcome.
    ///
    /// Returns `false` and leaves the job untouched when it is already
    /// terminal. Status, outcome fields and `completed_at` change together.
    pub fn apply_outcome(&mut self, outcome: JobOutcome, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = outcome.status();
        match outcome.normalized() {
            JobOutcome::Completed { outputs } => {
                self.outputs = Some(outputs);
                self.error = None;
            }
            JobOutcome::Failed { error } => {
                self.outputs = None;
                self.error = Some(error);
            }
        }
        self.completed_at = Some(at);
        true
    }

    /// Whether the outcome fields agree with the status.
    ///
    /// `outputs` is set iff completed, `error` iff failed, `completed_at` iff terminal.
    pub fn is_consistent(&self) -> bool {
        let outputs_ok = self.outputs.is_some() == (self.status == JobStatus::Completed);
        let error_ok = self.error.is_some() == (self.status == JobStatus::Failed);
        let completed_ok = self.completed_at.is_some() == self.status.is_terminal();
        outputs_ok && error_ok && completed_ok
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Error record attached to a failed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub message: String,
    pub code: String,
}

/// Longest stored error code, in characters
pub const MAX_ERROR_CODE_LEN: usize = 64;

/// Longest stored error message, in characters
pub const MAX_ERROR_MESSAGE_LEN: usize = 4096;

const TRUNCATION_MARKER: &str = "...(truncated)";

impl JobFailure {
    /// Build a failure record, bounded to what the ledger stores
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
        .normalized()
    }

    /// Strip NUL characters and cut both fields to their stored length
    pub fn normalized(self) -> Self {
        Self {
            code: bounded_text(&self.code, MAX_ERROR_CODE_LEN, ""),
            message: bounded_text(&self.message, MAX_ERROR_MESSAGE_LEN, TRUNCATION_MARKER),
        }
    }
}

/// Drop NUL characters and keep at most `max_chars`, ending with `marker` when cut
pub fn bounded_text(value: &str, max_chars: usize, marker: &str) -> String {
    let cleaned: String = value.chars().filter(|c| *c != '\0').collect();
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }

    let keep = max_chars.saturating_sub(marker.chars().count());
    let mut out: String = cleaned.chars().take(keep).collect();
    out.push_str(marker);
    out
}

/// Terminal result reported by the executor
///
/// Tagged by `status` on the wire so a report reads
/// `{"status": "completed", "outputs": {...}}` or
/// `{"status": "failed", "error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Completed { outputs: OutputManifest },
    Failed { error: JobFailure },
}

impl JobOutcome {
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        JobOutcome::Failed {
            error: JobFailure::new(code, message),
        }
    }

    /// Same outcome with NUL characters removed and failure fields bounded
    pub fn normalized(self) -> Self {
        match self {
            JobOutcome::Completed { outputs } => JobOutcome::Completed {
                outputs: outputs
                    .into_iter()
                    .map(|(kind, reference)| (kind.replace('\0', ""), reference.replace('\0', "")))
                    .collect(),
            },
            JobOutcome::Failed { error } => JobOutcome::Failed {
                error: error.normalized(),
            },
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed { .. } => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Machine error codes reported by the executor
pub mod error_codes {
    pub const PROCESSING_ERROR: &str = "PROCESSING_ERROR";
    pub const INPUT_DOWNLOAD_ERROR: &str = "INPUT_DOWNLOAD_ERROR";
    pub const EMPTY_INPUT: &str = "EMPTY_INPUT";
    pub const TRANSFORM_ERROR: &str = "TRANSFORM_ERROR";
    pub const ARTIFACT_UPLOAD_ERROR: &str = "ARTIFACT_UPLOAD_ERROR";
}
