//! Audit event types
//!
//! Events are append-only. The ledger writes them alongside the state change
//! they describe; nothing in the core reads them back to make decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            payload,
            created_at: now,
        }
    }

    /// Job id carried in the payload, if any
    pub fn job_id(&self) -> Option<Uuid> {
        self.payload
            .get("job_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// Event type tags
pub mod kinds {
    pub const JOB_CREATED: &str = "job.created";
    pub const JOB_COMPLETED: &str = "job.completed";
    pub const JOB_FAILED: &str = "job.failed";
    pub const JOB_DISPATCH_FAILED: &str = "job.dispatch_failed";
    pub const JOB_REDISPATCHED: &str = "job.redispatched";
    pub const CREDITS_GRANTED: &str = "account.credits_granted";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_payload() {
        let id = Uuid::new_v4();
        let event = Event::new(
            kinds::JOB_CREATED,
            serde_json::json!({ "job_id": id.to_string(), "owner": "a@x.com" }),
            Utc::now(),
        );
        assert_eq!(event.job_id(), Some(id));

        let other = Event::new(kinds::CREDITS_GRANTED, serde_json::json!({ "credits": 3 }), Utc::now());
        assert_eq!(other.job_id(), None);
    }
}
