//! Account Service
//!
//! Balance reads and the payment hook that adds credits.

use lectern_core::domain::account::Account;
use thiserror::Error;

use crate::repository::{Ledger, LedgerError};

/// Largest single grant accepted from the payment hook
pub const MAX_GRANT: i64 = 100_000;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub async fn get_account(ledger: &dyn Ledger, owner: &str) -> Result<Account, AccountError> {
    ledger
        .get_account(owner)
        .await?
        .ok_or_else(|| AccountError::NotFound(owner.to_string()))
}

/// Called once a payment is confirmed
pub async fn grant_credits(
    ledger: &dyn Ledger,
    owner: &str,
    credits: i64,
) -> Result<Account, AccountError> {
    if owner.trim().is_empty() {
        return Err(AccountError::Validation("owner cannot be empty".to_string()));
    }
    if credits <= 0 || credits > MAX_GRANT {
        return Err(AccountError::Validation(format!(
            "credits must be between 1 and {}",
            MAX_GRANT
        )));
    }

    let account = ledger.grant_credits(owner, credits).await?;
    tracing::info!(owner = %owner, "Granted {} credit(s), balance {}", credits, account.credits);
    Ok(account)
}
