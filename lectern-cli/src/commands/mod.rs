//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod account;
mod job;

pub use account::AccountCommands;
pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job submission and tracking
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Account credits
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Account { command } => account::handle_account_command(command, config).await,
    }
}
