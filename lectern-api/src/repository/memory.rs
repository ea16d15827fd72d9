//! In-memory ledger
//!
//! A single mutex guards accounts, jobs and events together, so every trait
//! method is one critical section. Used by tests and by local runs with
//! `LECTERN_LEDGER=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_core::domain::account::Account;
use lectern_core::domain::event::{Event, kinds};
use lectern_core::domain::job::{Job, JobOutcome, JobStatus};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    Ledger, LedgerError, NewJob, OutcomeApplied, Result, credits_granted_payload,
    job_created_payload, outcome_event_kind, outcome_payload,
};

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    jobs: HashMap<Uuid, Job>,
    events: Vec<Event>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn create_account(&self, owner: &str) -> Result<Account> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .entry(owner.to_string())
            .or_insert_with(|| Account::new(owner, Utc::now()));
        Ok(account.clone())
    }

    async fn get_account(&self, owner: &str) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(owner).cloned())
    }

    async fn grant_credits(&self, owner: &str, credits: i64) -> Result<Account> {
        if credits <= 0 {
            return Err(LedgerError::InvalidCredits(credits));
        }

        let now = Utc::now();
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .entry(owner.to_string())
            .or_insert_with(|| Account::new(owner, now));
        account.credits += credits;
        account.updated_at = now;
        let account = account.clone();

        state.events.push(Event::new(
            kinds::CREDITS_GRANTED,
            credits_granted_payload(owner, credits, account.credits),
            now,
        ));
        Ok(account)
    }

    async fn debit_and_create_job(&self, new_job: NewJob) -> Result<Job> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get_mut(&new_job.owner)
            .ok_or_else(|| LedgerError::AccountNotFound(new_job.owner.clone()))?;
        if !account.can_afford_job() {
            return Err(LedgerError::InsufficientCredit {
                owner: account.owner.clone(),
                credits: account.credits,
            });
        }
        account.credits -= 1;
        account.updated_at = now;
        let credits_left = account.credits;

        let job = Job::new_pending(new_job.owner, new_job.input_reference, new_job.options, now);
        state.events.push(Event::new(
            kinds::JOB_CREATED,
            job_created_payload(&job, credits_left),
            now,
        ));
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn record_outcome(
        &self,
        job_id: Uuid,
        outcome: JobOutcome,
        now: DateTime<Utc>,
    ) -> Result<OutcomeApplied> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or(LedgerError::UnknownJob(job_id))?;

        let kind = outcome_event_kind(&outcome);
        if !job.apply_outcome(outcome, now) {
            return Ok(OutcomeApplied::AlreadyTerminal(job.clone()));
        }
        let job = job.clone();

        state.events.push(Event::new(kind, outcome_payload(&job), now));
        Ok(OutcomeApplied::Applied(job))
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&job_id).cloned())
    }

    async fn list_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<Job>> {
        let state = self.state.lock().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Pending && j.created_at < created_before)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn append_event(&self, kind: &str, payload: serde_json::Value) -> Result<Event> {
        let event = Event::new(kind, payload, Utc::now());
        self.state.lock().await.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, job_id: Uuid) -> Result<Vec<Event>> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.job_id() == Some(job_id))
            .cloned()
            .collect())
    }
}
