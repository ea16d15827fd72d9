//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::WorkerState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Healthy only when the worker can report outcomes
pub async fn health_check(State(state): State<WorkerState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    if state.missing_settings.is_empty() {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                version,
                missing: Vec::new(),
            }),
        );
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            status: "unhealthy".to_string(),
            version,
            missing: state.missing_settings.iter().map(|s| s.to_string()).collect(),
        }),
    )
}
