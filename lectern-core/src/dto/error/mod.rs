//! Error body shared by every non-2xx API response

use serde::{Deserialize, Serialize};

/// `{"error": "...", "code": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Machine-readable codes carried in [`ErrorBody::code`]
pub mod codes {
    pub const INSUFFICIENT_CREDIT: &str = "INSUFFICIENT_CREDIT";
    pub const ACCOUNT_NOT_FOUND: &str = "ACCOUNT_NOT_FOUND";
    pub const INPUT_REFERENCE_MISSING: &str = "INPUT_REFERENCE_MISSING";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const JOB_NOT_FOUND: &str = "JOB_NOT_FOUND";
    pub const UNKNOWN_JOB: &str = "UNKNOWN_JOB";
    pub const INVALID_SIGNATURE: &str = "INVALID_SIGNATURE";
    pub const MALFORMED_PAYLOAD: &str = "MALFORMED_PAYLOAD";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const DISPATCH_FAILED: &str = "DISPATCH_FAILED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}
