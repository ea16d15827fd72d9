//! Outcome report DTOs (worker -> api callback)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::JobOutcome;

/// Header carrying the hex HMAC-SHA256 of the raw request body
pub const SIGNATURE_HEADER: &str = "X-Worker-Signature";

/// Terminal outcome of a job as reported by the worker
///
/// Flattened on the wire:
/// `{"job_id": "...", "status": "completed", "outputs": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub outcome: JobOutcome,
}

/// Acknowledgement returned for accepted reports, duplicates included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAck {
    pub ok: bool,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self { ok: true }
    }
}
