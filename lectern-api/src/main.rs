use std::sync::Arc;

use anyhow::Context;
use lectern_api::config::{Config, LedgerBackend};
use lectern_api::repository::{InMemoryLedger, Ledger, PgLedger};
use lectern_api::service::dispatch::HttpDispatcher;
use lectern_api::{AppState, create_router, db};
use lectern_client::WorkerClient;
use lectern_core::signature::CallbackSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lectern API...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let ledger: Arc<dyn Ledger> = match config.ledger {
        LedgerBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgLedger::new(pool))
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory ledger; state is lost on restart");
            Arc::new(InMemoryLedger::new())
        }
    };

    let store = lectern_storage::open_store(&config.artifact_store)
        .context("Failed to open artifact store")?;

    let worker = WorkerClient::new(&config.worker_url, config.dispatch_timeout)
        .context("Failed to build worker client")?;
    tracing::info!("Dispatching to worker at {}", worker.base_url());

    let callback_secret = CallbackSecret::new(config.callback_secret.as_bytes())
        .context("Invalid callback secret")?;

    let state = AppState {
        ledger,
        store,
        dispatcher: Arc::new(HttpDispatcher::new(worker)),
        callback_secret,
    };

    // Build router with all API endpoints
    let app = create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
