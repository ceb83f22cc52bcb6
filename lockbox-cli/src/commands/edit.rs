//! Edit command - overwrite a stored record
//!
//! Fields not given on the command line keep their stored values; the
//! vault always receives a complete field set.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_context, parse_id};
use lockbox_core::Record;

#[derive(Subcommand)]
pub enum EditCommands {
    /// Edit a credential
    Credential {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Edit a note
    Note {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
}

pub async fn run(command: EditCommands) -> Result<()> {
    let ctx = get_context().await?;

    match command {
        EditCommands::Credential {
            id,
            label,
            username,
            secret,
            category,
        } => {
            let id = parse_id(&id)?;
            let mut fields = ctx.vault.get_credential(id).await?.fields();
            if let Some(label) = label {
                fields.label = label;
            }
            if let Some(username) = username {
                fields.username = username;
            }
            if let Some(secret) = secret {
                fields.secret = secret;
            }
            if let Some(category) = category {
                fields.category = category;
            }
            let record = ctx.vault.edit_credential(id, fields).await?;
            println!("{} Credential '{}' updated", "Success!".green(), record.label);
        }
        EditCommands::Note {
            id,
            title,
            body,
            category,
        } => {
            let id = parse_id(&id)?;
            let mut fields = ctx.vault.get_note(id).await?.fields();
            if let Some(title) = title {
                fields.title = title;
            }
            if let Some(body) = body {
                fields.body = body;
            }
            if let Some(category) = category {
                fields.category = category;
            }
            let record = ctx.vault.edit_note(id, fields).await?;
            println!("{} Note '{}' updated", "Success!".green(), record.title);
        }
    }

    Ok(())
}
