//! Delete command - remove a credential or note

use anyhow::Result;
use clap::Subcommand;
use dialoguer::Confirm;

use super::{get_context, parse_id};

#[derive(Subcommand)]
pub enum DeleteCommands {
    /// Delete a credential
    Credential {
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
    /// Delete a note
    Note {
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn confirmed(prompt: String, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

pub async fn run(command: DeleteCommands) -> Result<()> {
    let ctx = get_context().await?;

    match command {
        DeleteCommands::Credential { id, force } => {
            let id = parse_id(&id)?;
            let record = ctx.vault.get_credential(id).await?;
            if !confirmed(format!("Delete credential '{}'?", record.label), force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.vault.delete_credential(id).await?;
            println!("Deleted credential '{}'", record.label);
        }
        DeleteCommands::Note { id, force } => {
            let id = parse_id(&id)?;
            let record = ctx.vault.get_note(id).await?;
            if !confirmed(format!("Delete note '{}'?", record.title), force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.vault.delete_note(id).await?;
            println!("Deleted note '{}'", record.title);
        }
    }

    Ok(())
}
