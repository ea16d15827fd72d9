use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Accounts: balance never below zero
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            owner VARCHAR(320) PRIMARY KEY,
            credits BIGINT NOT NULL DEFAULT 0 CHECK (credits >= 0),
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Jobs: outcome columns must agree with status
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id UUID PRIMARY KEY,
            owner VARCHAR(320) NOT NULL REFERENCES accounts(owner),
            input_reference TEXT NOT NULL,
            options JSONB NOT NULL DEFAULT '{}',
            status VARCHAR(20) NOT NULL CHECK (status IN ('pending', 'completed', 'failed')),
            outputs JSONB,
            error_code VARCHAR(64),
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ,
            CONSTRAINT jobs_outcome_matches_status CHECK (
                (status = 'pending'
                    AND outputs IS NULL AND error_code IS NULL AND completed_at IS NULL)
                OR (status = 'completed'
                    AND outputs IS NOT NULL AND error_code IS NULL AND completed_at IS NOT NULL)
                OR (status = 'failed'
                    AND outputs IS NULL AND error_code IS NOT NULL AND completed_at IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Events: append-only audit trail
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id UUID PRIMARY KEY,
            kind VARCHAR(64) NOT NULL,
            payload JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_owner ON jobs(owner)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_jobs_pending_created_at ON jobs(created_at) WHERE status = 'pending'",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_job_id ON events((payload->>'job_id'))")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
