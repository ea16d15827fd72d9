//! API Module
//!
//! HTTP surface of the worker: job intake from the api and a health check.

pub mod health;
pub mod process;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::scheduler::JobExecutor;

/// Shared state for worker handlers
#[derive(Clone)]
pub struct WorkerState {
    pub executor: Arc<JobExecutor>,
    /// Settings whose absence keeps the worker unhealthy
    pub missing_settings: Arc<Vec<&'static str>>,
}

/// Create the worker router
pub fn create_router(state: WorkerState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/process", post(process::accept_job))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::service::{EchoTransformer, ReporterService, StandardExecutionService};
    use lectern_storage::{ArtifactStore, ObjectArtifactStore};
    use std::time::Duration;

    /// Serve the router on an ephemeral port, returning its base URL
    pub async fn spawn_worker(
        store: Arc<dyn ArtifactStore>,
        reporter: Arc<dyn ReporterService>,
        missing_settings: Vec<&'static str>,
    ) -> String {
        let execution = Arc::new(StandardExecutionService::new(
            store,
            Arc::new(EchoTransformer),
            Duration::from_secs(60),
        ));
        let state = WorkerState {
            executor: Arc::new(JobExecutor::new(2, execution, reporter)),
            missing_settings: Arc::new(missing_settings),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn empty_store() -> Arc<dyn ArtifactStore> {
        Arc::new(ObjectArtifactStore::in_memory())
    }
}
