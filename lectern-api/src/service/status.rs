//! Status Service
//!
//! Read-only projection of a job for pollers.

use lectern_core::dto::job::JobView;
use thiserror::Error;
use uuid::Uuid;

use crate::repository::{Ledger, LedgerError};

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub async fn get_job_view(ledger: &dyn Ledger, job_id: Uuid) -> Result<JobView, StatusError> {
    let job = ledger
        .get_job(job_id)
        .await?
        .ok_or(StatusError::NotFound(job_id))?;

    Ok(JobView::from(job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryLedger;

    #[tokio::test]
    async fn test_missing_job_is_not_found() {
        let ledger = InMemoryLedger::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            get_job_view(&ledger, id).await,
            Err(StatusError::NotFound(missing)) if missing == id
        ));
    }
}
