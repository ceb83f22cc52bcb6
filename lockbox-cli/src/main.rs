//! Lockbox CLI - passwords and secure notes in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{add, backup, delete, edit, list, logs, setup};

/// Lockbox - a local vault for credentials and notes
#[derive(Parser)]
#[command(name = "lb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure how secrets are revealed
    Setup {
        #[command(subcommand)]
        command: setup::SetupCommands,
    },

    /// Add a credential or note
    Add {
        #[command(subcommand)]
        command: add::AddCommands,
    },

    /// Edit a stored record
    Edit {
        #[command(subcommand)]
        command: edit::EditCommands,
    },

    /// Delete a stored record
    Delete {
        #[command(subcommand)]
        command: delete::DeleteCommands,
    },

    /// List records (secrets masked unless revealed)
    List {
        #[command(subcommand)]
        command: list::ListCommands,
    },

    /// Export, import and list backups
    Backup {
        #[command(subcommand)]
        command: backup::BackupCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Setup { .. } => "setup",
            Commands::Add { .. } => "add",
            Commands::Edit { .. } => "edit",
            Commands::Delete { .. } => "delete",
            Commands::List { .. } => "list",
            Commands::Backup { .. } => "backup",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOCKBOX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.name();
    let logger = commands::get_logger();

    let result = run(cli).await;
    commands::log_outcome(&logger, command, &result);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Setup { command } => setup::run(command).await,
        Commands::Add { command } => add::run(command).await,
        Commands::Edit { command } => edit::run(command).await,
        Commands::Delete { command } => delete::run(command).await,
        Commands::List { command } => list::run(command).await,
        Commands::Backup { command } => backup::run(command).await,
        Commands::Logs { command } => logs::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_is_never_taken_from_argv() {
        assert!(Cli::try_parse_from(["lb", "list", "credentials", "--reveal"]).is_ok());
        assert!(Cli::try_parse_from(["lb", "list", "credentials", "--reveal", "--pin", "1234"]).is_err());
        assert!(Cli::try_parse_from(["lb", "setup", "pin"]).is_ok());
        assert!(Cli::try_parse_from(["lb", "setup", "pin", "--pin", "1234"]).is_err());
    }
}
