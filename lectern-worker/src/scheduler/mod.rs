//! Scheduler layer for the worker
//!
//! Accepted jobs are handed to the executor, which runs them in background
//! tasks bounded by the parallelism limit and reports each outcome.

pub mod executor;

pub use executor::JobExecutor;
