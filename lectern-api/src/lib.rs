//! Lectern API
//!
//! Job submission, outcome callbacks and status polling over a credit ledger.

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod state;

pub use api::create_router;
pub use state::AppState;
