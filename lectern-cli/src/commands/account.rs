//! Account command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use lectern_client::ApiClient;
use lectern_core::domain::account::Account;

use crate::config::Config;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Add credits to an account (creates it if needed)
    Credit {
        /// Account owner
        owner: String,

        /// Number of credits to add
        credits: i64,
    },
    /// Show an account balance
    Get {
        /// Account owner
        owner: String,
    },
}

/// Handle account commands
pub async fn handle_account_command(command: AccountCommands, config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.api_url);

    match command {
        AccountCommands::Credit { owner, credits } => {
            let account = client
                .grant_credits(&owner, credits)
                .await
                .context("Failed to grant credits")?;
            println!("{}", format!("✓ Granted {} credit(s)", credits).green());
            print_account(&account);
            Ok(())
        }
        AccountCommands::Get { owner } => {
            let account = client.get_account(&owner).await?;
            print_account(&account);
            Ok(())
        }
    }
}

fn print_account(account: &Account) {
    let credits = if account.can_afford_job() {
        account.credits.to_string().green()
    } else {
        account.credits.to_string().red()
    };

    println!("{}", "Account:".bold());
    println!("  Owner:   {}", account.owner.cyan());
    println!("  Credits: {}", credits);
    println!(
        "  Updated: {}",
        account.updated_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
    );
}
