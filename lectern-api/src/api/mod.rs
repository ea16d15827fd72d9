//! API Module
//!
//! HTTP API layer for lectern.
//! Each submodule handles endpoints for a specific domain.

pub mod account;
pub mod callback;
pub mod error;
pub mod health;
pub mod job;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/jobs", post(job::submit_job))
        .route("/jobs/stale", get(job::list_stale_jobs))
        .route("/jobs/{id}", get(job::get_job))
        .route("/jobs/{id}/dispatch", post(job::redispatch_job))
        // Worker callback
        .route("/callback", post(callback::receive_callback))
        // Account endpoints
        .route("/accounts/{owner}", get(account::get_account))
        .route("/accounts/{owner}/credits", post(account::grant_credits))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
