//! Lectern CLI
//!
//! Command-line interface for submitting lecture jobs to the Lectern api,
//! following their progress and managing account credits.

mod commands;
mod config;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Lectern study-material CLI", long_about = None)]
struct Cli {
    /// Api URL
    #[arg(long, env = "LECTERN_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AccountCommands, JobCommands};

    #[test]
    fn test_parses_submit_with_options() {
        let cli = Cli::try_parse_from([
            "lectern",
            "--api-url",
            "http://api:8080",
            "job",
            "submit",
            "--owner",
            "a@x.com",
            "--input",
            "uploads/f.pdf",
            "--option",
            "language=English",
        ])
        .unwrap();

        assert_eq!(cli.api_url, "http://api:8080");
        let Commands::Job {
            command: JobCommands::Submit { owner, input, options },
        } = cli.command
        else {
            panic!("expected job submit");
        };
        assert_eq!(owner, "a@x.com");
        assert_eq!(input, "uploads/f.pdf");
        assert_eq!(options[0].key, "language");
        assert_eq!(options[0].value, "English");
    }

    #[test]
    fn test_wait_defaults() {
        let cli = Cli::try_parse_from(["lectern", "job", "wait", "some-id"]).unwrap();
        let Commands::Job {
            command: JobCommands::Wait { timeout_secs, interval_secs, .. },
        } = cli.command
        else {
            panic!("expected job wait");
        };
        assert_eq!(timeout_secs, 300);
        assert_eq!(interval_secs, 3);
    }

    #[test]
    fn test_parses_account_credit() {
        let cli = Cli::try_parse_from(["lectern", "account", "credit", "a@x.com", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Account {
                command: AccountCommands::Credit { credits: 5, .. }
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_option() {
        assert!(
            Cli::try_parse_from([
                "lectern", "job", "submit", "--owner", "a", "--input", "b", "--option", "novalue",
            ])
            .is_err()
        );
    }
}
