//! Repository Module
//!
//! The ledger is the only owner of persistent state: accounts, jobs and the
//! audit trail. Every state change that must be atomic lives behind a single
//! trait method so callers cannot split it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_core::domain::account::Account;
use lectern_core::domain::event::Event;
use lectern_core::domain::job::{Job, JobOptions, JobOutcome};
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryLedger;
pub use postgres::PgLedger;

/// Input for [`Ledger::debit_and_create_job`]
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner: String,
    pub input_reference: String,
    pub options: JobOptions,
}

/// Result of recording an outcome
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeApplied {
    /// The job moved from pending to the reported terminal state
    Applied(Job),
    /// The job was already terminal; nothing changed
    AlreadyTerminal(Job),
}

impl OutcomeApplied {
    pub fn job(&self) -> &Job {
        match self {
            OutcomeApplied::Applied(job) | OutcomeApplied::AlreadyTerminal(job) => job,
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("account {owner} has insufficient credit ({credits})")]
    InsufficientCredit { owner: String, credits: i64 },

    #[error("job {0} not found")]
    UnknownJob(Uuid),

    #[error("credit grant must be positive, got {0}")]
    InvalidCredits(i64),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Create the account with a zero balance; returns the existing one if present
    async fn create_account(&self, owner: &str) -> Result<Account>;

    async fn get_account(&self, owner: &str) -> Result<Option<Account>>;

    /// Add credits, creating the account when it does not exist yet
    async fn grant_credits(&self, owner: &str, credits: i64) -> Result<Account>;

    /// Debit one credit and create a pending job as a single atomic unit.
    ///
    /// On any error neither the balance nor the job table changes.
    async fn debit_and_create_job(&self, new_job: NewJob) -> Result<Job>;

    /// Move a pending job to its terminal state.
    ///
    /// A job that is already terminal is returned untouched as
    /// [`OutcomeApplied::AlreadyTerminal`] and no event is written.
    async fn record_outcome(
        &self,
        job_id: Uuid,
        outcome: JobOutcome,
        now: DateTime<Utc>,
    ) -> Result<OutcomeApplied>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Pending jobs created before `created_before`, oldest first
    async fn list_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<Job>>;

    async fn append_event(&self, kind: &str, payload: serde_json::Value) -> Result<Event>;

    /// Events whose payload references `job_id`, oldest first
    async fn list_events(&self, job_id: Uuid) -> Result<Vec<Event>>;
}

// =============================================================================
// Event payloads shared by the implementations
// =============================================================================

pub(crate) fn job_created_payload(job: &Job, credits_left: i64) -> serde_json::Value {
    serde_json::json!({
        "job_id": job.id,
        "owner": job.owner,
        "input_reference": job.input_reference,
        "credits_left": credits_left,
    })
}

pub(crate) fn outcome_payload(job: &Job) -> serde_json::Value {
    serde_json::json!({
        "job_id": job.id,
        "status": job.status,
        "error_code": job.error.as_ref().map(|e| e.code.as_str()),
    })
}

pub(crate) fn credits_granted_payload(owner: &str, credits: i64, balance: i64) -> serde_json::Value {
    serde_json::json!({
        "owner": owner,
        "credits": credits,
        "balance": balance,
    })
}

/// Event kind for an outcome; only terminal outcomes produce an event
pub(crate) fn outcome_event_kind(outcome: &JobOutcome) -> &'static str {
    use lectern_core::domain::event::kinds;

    match outcome {
        JobOutcome::Completed { .. } => kinds::JOB_COMPLETED,
        JobOutcome::Failed { .. } => kinds::JOB_FAILED,
    }
}
