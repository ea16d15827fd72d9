//! PostgreSQL ledger
//!
//! Debits are a conditional `UPDATE ... WHERE credits >= 1` inside the same
//! transaction as the job insert, so the row lock taken by the update
//! serializes concurrent submissions for one account. Outcome recording
//! locks the job row with `SELECT ... FOR UPDATE` before the terminal check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_core::domain::account::Account;
use lectern_core::domain::event::{Event, kinds};
use lectern_core::domain::job::{Job, JobFailure, JobOptions, JobOutcome, JobStatus, OutputManifest};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::{
    Ledger, LedgerError, NewJob, OutcomeApplied, Result, credits_granted_payload,
    job_created_payload, outcome_event_kind, outcome_payload,
};

const JOB_COLUMNS: &str = "id, owner, input_reference, options, status, outputs, \
                           error_code, error_message, created_at, completed_at";

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn create_account(&self, owner: &str) -> Result<Account> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO accounts (owner, credits, created_at, updated_at)
            VALUES ($1, 0, $2, $2)
            ON CONFLICT (owner) DO NOTHING
            "#,
        )
        .bind(owner)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_account(owner)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(owner.to_string()))
    }

    async fn get_account(&self, owner: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT owner, credits, created_at, updated_at FROM accounts WHERE owner = $1",
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn grant_credits(&self, owner: &str, credits: i64) -> Result<Account> {
        if credits <= 0 {
            return Err(LedgerError::InvalidCredits(credits));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let account: Account = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (owner, credits, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (owner) DO UPDATE
            SET credits = accounts.credits + EXCLUDED.credits,
                updated_at = EXCLUDED.updated_at
            RETURNING owner, credits, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(credits)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?
        .into();

        insert_event(
            &mut tx,
            &Event::new(
                kinds::CREDITS_GRANTED,
                credits_granted_payload(owner, credits, account.credits),
                now,
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(account)
    }

    #[instrument(skip(self, new_job), fields(owner = %new_job.owner))]
    async fn debit_and_create_job(&self, new_job: NewJob) -> Result<Job> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let debited: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE accounts
            SET credits = credits - 1, updated_at = $2
            WHERE owner = $1 AND credits >= 1
            RETURNING credits
            "#,
        )
        .bind(&new_job.owner)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((credits_left,)) = debited else {
            let existing: Option<(i64,)> =
                sqlx::query_as("SELECT credits FROM accounts WHERE owner = $1")
                    .bind(&new_job.owner)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return Err(match existing {
                None => LedgerError::AccountNotFound(new_job.owner),
                Some((credits,)) => LedgerError::InsufficientCredit {
                    owner: new_job.owner,
                    credits,
                },
            });
        };

        let job = Job::new_pending(new_job.owner, new_job.input_reference, new_job.options, now);

        sqlx::query(
            r#"
            INSERT INTO jobs (id, owner, input_reference, options, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(job.id)
        .bind(&job.owner)
        .bind(&job.input_reference)
        .bind(Json(&job.options))
        .bind(job.status.as_str())
        .bind(job.created_at)
        .execute(&mut *tx)
        .await?;

        insert_event(
            &mut tx,
            &Event::new(kinds::JOB_CREATED, job_created_payload(&job, credits_left), now),
        )
        .await?;

        tx.commit().await?;
        Ok(job)
    }

    #[instrument(skip(self, outcome))]
    async fn record_outcome(
        &self,
        job_id: Uuid,
        outcome: JobOutcome,
        now: DateTime<Utc>,
    ) -> Result<OutcomeApplied> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1 FOR UPDATE",
            JOB_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(LedgerError::UnknownJob(job_id));
        };

        let mut job = Job::try_from(row)?;
        let kind = outcome_event_kind(&outcome);
        if !job.apply_outcome(outcome, now) {
            tx.rollback().await?;
            return Ok(OutcomeApplied::AlreadyTerminal(job));
        }

        let (error_code, error_message) = match &job.error {
            Some(err) => (Some(err.code.as_str()), Some(err.message.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2, outputs = $3, error_code = $4, error_message = $5, completed_at = $6
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(job.outputs.as_ref().map(Json))
        .bind(error_code)
        .bind(error_message)
        .bind(job.completed_at)
        .execute(&mut *tx)
        .await?;

        insert_event(&mut tx, &Event::new(kind, outcome_payload(&job), now)).await?;

        tx.commit().await?;
        Ok(OutcomeApplied::Applied(job))
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn list_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE status = 'pending' AND created_at < $1 ORDER BY created_at ASC",
            JOB_COLUMNS
        ))
        .bind(created_before)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn append_event(&self, kind: &str, payload: serde_json::Value) -> Result<Event> {
        let event = Event::new(kind, payload, Utc::now());
        let mut tx = self.pool.begin().await?;
        insert_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn list_events(&self, job_id: Uuid) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, kind, payload, created_at
            FROM events
            WHERE payload->>'job_id' = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(job_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

async fn insert_event(tx: &mut Transaction<'_, Postgres>, event: &Event) -> Result<()> {
    sqlx::query("INSERT INTO events (id, kind, payload, created_at) VALUES ($1, $2, $3, $4)")
        .bind(event.id)
        .bind(&event.kind)
        .bind(&event.payload)
        .bind(event.created_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    owner: String,
    credits: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            owner: row.owner,
            credits: row.credits,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    owner: String,
    input_reference: String,
    options: Json<JobOptions>,
    status: String,
    outputs: Option<Json<OutputManifest>>,
    error_code: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = LedgerError;

    fn try_from(row: JobRow) -> Result<Self> {
        let status: JobStatus = row.status.parse().map_err(LedgerError::Corrupt)?;
        let error = row
            .error_code
            .map(|code| JobFailure::new(code, row.error_message.unwrap_or_default()));

        Ok(Job {
            id: row.id,
            owner: row.owner,
            input_reference: row.input_reference,
            options: row.options.0,
            status,
            outputs: row.outputs.map(|o| o.0),
            error,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    kind: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            kind: row.kind,
            payload: row.payload,
            created_at: row.created_at,
        }
    }
}
