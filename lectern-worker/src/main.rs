//! Lectern Worker
//!
//! A stateless worker that turns lecture documents into study materials.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Services: Transformation, rendering, execution and outcome reporting
//! - Scheduler: Bounded background execution of accepted jobs
//! - API: Job intake and health check
//!
//! The api dispatches jobs to `POST /process`; the worker acknowledges at
//! once, processes the input in the background and reports the outcome to
//! the api through an HMAC-signed callback.

mod api;
mod config;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{WorkerState, create_router};
use crate::config::Config;
use crate::scheduler::JobExecutor;
use crate::service::{
    CallbackReporter, EchoTransformer, ExecutionService, HttpTransformer, ReporterService,
    StandardExecutionService, Transformer, UnconfiguredReporter,
};
use lectern_client::CallbackClient;
use lectern_core::signature::CallbackSecret;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern_worker=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lectern Worker");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(
        "Loaded configuration: bind_addr={}, max_parallel_jobs={}",
        config.bind_addr, config.max_parallel_jobs
    );

    let store = lectern_storage::open_store(&config.artifact_store)
        .context("Failed to open artifact store")?;

    let transformer: Arc<dyn Transformer> = match &config.transformer_url {
        Some(url) => {
            info!("Using transformer gateway at {}", url);
            Arc::new(
                HttpTransformer::new(url.clone(), config.transform_timeout)
                    .context("Failed to build transformer client")?,
            )
        }
        None => {
            warn!("TRANSFORMER_URL not set; using offline transformer");
            Arc::new(EchoTransformer)
        }
    };

    let missing = config.missing_settings();
    let reporter = build_reporter(&config, &missing)?;

    let execution: Arc<dyn ExecutionService> = Arc::new(StandardExecutionService::new(
        store,
        transformer,
        config.presign_ttl,
    ));
    let executor = Arc::new(JobExecutor::new(
        config.max_parallel_jobs,
        execution,
        reporter,
    ));

    info!("Services initialized");

    let state = WorkerState {
        executor,
        missing_settings: Arc::new(missing),
    };
    let app = create_router(state);

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

/// Builds the outcome reporter, falling back to one that only logs while
/// callback settings are missing
fn build_reporter(config: &Config, missing: &[&'static str]) -> Result<Arc<dyn ReporterService>> {
    let (Some(url), Some(secret)) = (&config.callback_url, &config.callback_secret) else {
        warn!(
            "Callback not configured (missing: {}); outcomes cannot be delivered",
            missing.join(", ")
        );
        return Ok(Arc::new(UnconfiguredReporter::new(missing.to_vec())));
    };

    let secret = CallbackSecret::new(secret.as_bytes()).context("Invalid callback secret")?;
    let client = CallbackClient::new(url.clone(), secret, config.callback_timeout)
        .context("Failed to build callback client")?;
    info!("Reporting outcomes to {}", client.url());

    Ok(Arc::new(CallbackReporter::new(client)))
}
