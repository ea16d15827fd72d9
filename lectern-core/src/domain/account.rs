//! Account domain model
//!
//! A billable identity holding a credit balance. One credit pays for one job
//! submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paying user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owner identity (account email or external auth id)
    pub owner: String,

    /// Remaining credits, never negative
    pub credits: i64,

    /// When the account was first seen
    pub created_at: DateTime<Utc>,

    /// Last balance change
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(owner: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            owner: owner.into(),
            credits: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_afford_job(&self) -> bool {
        self.credits >= 1
    }
}
