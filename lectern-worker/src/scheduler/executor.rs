//! Job executor
//!
//! Runs accepted jobs in background tasks. A semaphore bounds how many run
//! at once; excess jobs wait for a slot instead of being dropped.

use std::sync::Arc;

use lectern_core::dto::job::DispatchJob;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::service::{ExecutionService, ReporterService};

/// Executes accepted jobs and reports their outcomes
pub struct JobExecutor {
    execution: Arc<dyn ExecutionService>,
    reporter: Arc<dyn ReporterService>,
    semaphore: Arc<Semaphore>,
}

impl JobExecutor {
    pub fn new(
        max_parallel_jobs: usize,
        execution: Arc<dyn ExecutionService>,
        reporter: Arc<dyn ReporterService>,
    ) -> Self {
        Self {
            execution,
            reporter,
            semaphore: Arc::new(Semaphore::new(max_parallel_jobs)),
        }
    }

    /// Number of free execution slots
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Spawns a task that runs `job` once a slot is free
    pub fn submit(&self, job: DispatchJob) -> JoinHandle<()> {
        let execution = Arc::clone(&self.execution);
        let reporter = Arc::clone(&self.reporter);
        let semaphore = Arc::clone(&self.semaphore);

        tokio::spawn(async move {
            let job_id = job.job_id;

            debug!(job_id = %job_id, "Waiting for execution slot");
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!(job_id = %job_id, "Executor closed, dropping job");
                    return;
                }
            };

            info!(job_id = %job_id, "Starting execution");
            let report = execution.execute(&job).await;

            if let Err(e) = reporter.report(&report).await {
                error!(job_id = %job_id, "Failed to report outcome: {}", e);
            }
            // Permit is released when dropped
        })
    }
}
