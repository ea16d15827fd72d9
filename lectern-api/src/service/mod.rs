//! Service Module
//!
//! Business logic layer for the api.
//! Services orchestrate between the ledger, the artifact store and the
//! worker, and contain the job lifecycle rules.

pub mod account;
pub mod callback;
pub mod dispatch;
pub mod recovery;
pub mod status;
pub mod submission;

// Re-export for convenience
pub use account as account_service;
pub use callback as callback_service;
pub use recovery as recovery_service;
pub use status as status_service;
pub use submission as submission_service;

#[cfg(test)]
pub(crate) mod testing;
