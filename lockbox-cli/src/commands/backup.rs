//! Backup command - export, import and manage backup artifacts

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::{Confirm, Password};

use super::get_context;
use crate::output;
use lockbox_core::domain::format_size;
use lockbox_core::ports::ArtifactLocation;
use lockbox_core::ExportOptions;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write a backup of the vault to the backups directory
    Export {
        /// Seal the backup with this passphrase
        #[arg(long, env = "LOCKBOX_BACKUP_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Prompt for a passphrase and seal the backup
        #[arg(long, conflicts_with = "passphrase")]
        encrypt: bool,
        /// Leave notes out of the backup
        #[arg(long)]
        no_notes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge a backup file into the vault
    Import {
        /// Path to a backup file, or the name of one in the backups directory
        path: PathBuf,
        /// Passphrase for a sealed backup (prompted when needed)
        #[arg(long, env = "LOCKBOX_BACKUP_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available backups
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all backups
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Sealed artifacts carry this marker near the top of the file
fn looks_sealed(path: &Path) -> bool {
    std::fs::read(path)
        .map(|bytes| {
            String::from_utf8_lossy(&bytes[..bytes.len().min(256)])
                .contains(lockbox_core::domain::SEALED_FORMAT)
        })
        .unwrap_or(false)
}

pub async fn run(command: BackupCommands) -> Result<()> {
    let ctx = get_context().await?;

    match command {
        BackupCommands::Export {
            passphrase,
            encrypt,
            no_notes,
            json,
        } => {
            let passphrase = match passphrase {
                Some(p) => Some(p),
                None if encrypt => Some(
                    Password::new()
                        .with_prompt("Backup passphrase")
                        .with_confirmation("Confirm passphrase", "Passphrases do not match")
                        .interact()?,
                ),
                None => None,
            };
            let mut options = ExportOptions {
                passphrase,
                ..ExportOptions::default()
            };
            if no_notes {
                options = options.without_notes();
            }

            let receipt = ctx.vault.export_backup(options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                println!("{}", "Backup created".green());
                println!("  Location: {}", receipt.location);
                println!("  Credentials: {}", receipt.credentials);
                println!("  Notes: {}", receipt.notes);
                println!("  Encrypted: {}", if receipt.encrypted { "yes" } else { "no" });
                println!("  Size: {}", format_size(receipt.size_bytes as u64));
                if !receipt.encrypted {
                    output::warning("This backup contains your secrets in plaintext.");
                }
            }
        }
        BackupCommands::Import {
            path,
            passphrase,
            json,
        } => {
            let path = if path.exists() {
                path
            } else {
                ctx.backups.path_of(&path.to_string_lossy())
            };
            let passphrase = match passphrase {
                Some(p) => Some(p),
                None if !json && looks_sealed(&path) => {
                    Some(Password::new().with_prompt("Backup passphrase").interact()?)
                }
                None => None,
            };

            let result = ctx
                .vault
                .import_backup(&ArtifactLocation::Path(path.clone()), passphrase.as_deref())
                .await
                .with_context(|| format!("Failed to import {}", path.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} Imported {} credential(s) and {} note(s)",
                    "Success!".green(),
                    result.credentials_imported,
                    result.notes_imported
                );
                if !result.errors.is_empty() {
                    output::warning(&format!("{} entries were skipped:", result.errors.len()));
                    for error in &result.errors {
                        println!("  {}", error);
                    }
                }
            }
        }
        BackupCommands::List { json } => {
            let backups = ctx.backups.list()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&backups)?);
                return Ok(());
            }

            if backups.is_empty() {
                println!("No backups found.");
                return Ok(());
            }

            let mut table = output::table(&["Name", "Created", "Size"]);
            for backup in backups {
                let size = backup.size_display();
                table.add_row(vec![
                    backup.name,
                    backup.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    size,
                ]);
            }
            println!("{}", table);
        }
        BackupCommands::Clear { force, json } => {
            if !force
                && !json
                && !Confirm::new()
                    .with_prompt("Delete all backups?")
                    .default(false)
                    .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }
            let result = ctx.backups.clear()?;
            if json {
                println!("{}", serde_json::json!({"deleted": result.deleted}));
            } else {
                println!("Deleted {} backup(s)", result.deleted);
            }
        }
    }

    Ok(())
}
