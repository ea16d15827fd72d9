//! Job command handlers
//!
//! Handles submitting jobs, viewing their state, waiting for completion
//! and recovering stuck jobs.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use lectern_client::{ApiClient, WaitOutcome};
use lectern_core::domain::job::{JobOptions, JobStatus};
use lectern_core::dto::job::{JobSummary, JobView, SubmitJob};
use uuid::Uuid;

use crate::config::Config;
use crate::types::KeyValue;

/// Shown when the wait window elapses before the job finishes
pub const STILL_PROCESSING: &str = "still processing, you will be notified when it is ready";

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a lecture document (costs one credit)
    Submit {
        /// Account paying for the job
        #[arg(long)]
        owner: String,

        /// Artifact-store key of the uploaded document
        #[arg(long)]
        input: String,

        /// Processing option as key=value (repeatable)
        #[arg(long = "option")]
        options: Vec<KeyValue>,
    },
    /// Get job details
    Get {
        /// Job ID
        id: String,
    },
    /// Wait until a job finishes
    Wait {
        /// Job ID
        id: String,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,

        /// Seconds between polls
        #[arg(long, default_value_t = 3)]
        interval_secs: u64,
    },
    /// List jobs still pending after a threshold
    Stale {
        #[arg(long, default_value_t = 900)]
        older_than_secs: u64,
    },
    /// Send a pending job to the worker again
    Redispatch {
        /// Job ID
        id: String,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.api_url);

    match command {
        JobCommands::Submit {
            owner,
            input,
            options,
        } => submit_job(&client, owner, input, options).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Wait {
            id,
            timeout_secs,
            interval_secs,
        } => wait_for_job(&client, &id, timeout_secs, interval_secs).await,
        JobCommands::Stale { older_than_secs } => list_stale_jobs(&client, older_than_secs).await,
        JobCommands::Redispatch { id } => redispatch_job(&client, &id).await,
    }
}

async fn submit_job(
    client: &ApiClient,
    owner: String,
    input: String,
    options: Vec<KeyValue>,
) -> Result<()> {
    let options: JobOptions = options.into_iter().map(|kv| (kv.key, kv.value)).collect();
    let req = SubmitJob {
        owner: owner.clone(),
        input_reference: input,
        options,
    };

    match client.submit_job(&req).await {
        Ok(submitted) => {
            println!("{}", "✓ Job submitted".green());
            println!("  ID: {}", submitted.job_id.to_string().cyan());
            Ok(())
        }
        Err(e) if e.is_insufficient_credit() => {
            eprintln!(
                "{}",
                format!("✗ {} has no credits left; buy more credits to submit", owner).red()
            );
            anyhow::bail!("insufficient credit")
        }
        Err(e) => Err(e).context("Failed to submit job"),
    }
}

async fn get_job(client: &ApiClient, id: &str) -> Result<()> {
    let job_id = parse_job_id(id)?;
    let job = client.get_job(job_id).await?;

    print_job_details(&job);

    Ok(())
}

/// Poll until the job is terminal; a timeout is not an error
async fn wait_for_job(
    client: &ApiClient,
    id: &str,
    timeout_secs: u64,
    interval_secs: u64,
) -> Result<()> {
    let job_id = parse_job_id(id)?;
    println!(
        "{}",
        format!("Waiting up to {}s for job {}...", timeout_secs, job_id).dimmed()
    );

    let outcome = client
        .wait_for_job(
            job_id,
            Duration::from_secs(timeout_secs),
            Duration::from_secs(interval_secs),
        )
        .await?;

    match outcome {
        WaitOutcome::Finished(job) => print_job_details(&job),
        WaitOutcome::TimedOut(_) => println!("{}", STILL_PROCESSING.yellow()),
    }

    Ok(())
}

async fn list_stale_jobs(client: &ApiClient, older_than_secs: u64) -> Result<()> {
    let jobs = client
        .list_stale_jobs(Duration::from_secs(older_than_secs))
        .await?;

    if jobs.is_empty() {
        println!("{}", "No stale jobs found.".yellow());
    } else {
        println!(
            "{}",
            format!(
                "Found {} job(s) pending for more than {}s:",
                jobs.len(),
                older_than_secs
            )
            .bold()
        );
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

async fn redispatch_job(client: &ApiClient, id: &str) -> Result<()> {
    let job_id = parse_job_id(id)?;
    let accepted = client
        .redispatch_job(job_id)
        .await
        .context("Failed to redispatch job")?;

    println!(
        "{} {} ({})",
        "✓ Job".green(),
        accepted.job_id.to_string().cyan(),
        accepted.status
    );

    Ok(())
}

fn parse_job_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("'{}' is not a valid job ID", id))
}

/// Print a job summary row
fn print_job_summary(job: &JobSummary) {
    println!("  {} Job {}", "▸".cyan(), job.job_id.to_string().dimmed());
    println!("    Owner:   {}", job.owner);
    println!("    Input:   {}", job.input_reference.dimmed());
    println!("    Status:  {}", colorize_status(&job.status));
    println!(
        "    Created: {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &JobView) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.job_id.to_string().cyan());
    println!("  Status:    {}", colorize_status(&job.status));
    println!("  Created:   {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(completed) = job.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));
        let seconds = completed.signed_duration_since(job.created_at).num_seconds();
        println!("  Duration:  {}s", seconds);
    }

    if let Some(outputs) = &job.outputs {
        println!("\n{}", "Outputs:".bold());
        let mut entries: Vec<_> = outputs.iter().collect();
        entries.sort();
        for (kind, reference) in entries {
            println!("  {} = {}", kind.cyan(), reference);
        }
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("  Code:    {}", error.code.red());
        println!("  Message: {}", error.message);
    }
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> ColoredString {
    match status {
        JobStatus::Pending => status.as_str().yellow(),
        JobStatus::Completed => status.as_str().green(),
        JobStatus::Failed => status.as_str().red(),
    }
}
