//! Add command - create credentials and notes

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::{Input, Password};

use super::get_context;
use lockbox_core::domain::{generate_secret, DEFAULT_SECRET_LENGTH};
use lockbox_core::{CredentialFields, NoteFields};

#[derive(Subcommand)]
pub enum AddCommands {
    /// Add a credential
    Credential {
        /// Site or application name
        #[arg(long)]
        label: String,
        #[arg(long)]
        username: String,
        /// Secret to store (prompted when neither this nor --generate is given)
        #[arg(long, conflicts_with = "generate")]
        secret: Option<String>,
        /// Generate a random secret
        #[arg(long)]
        generate: bool,
        /// Length of the generated secret
        #[arg(long, default_value_t = DEFAULT_SECRET_LENGTH)]
        length: usize,
        #[arg(long, default_value = "")]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a secure note
    Note {
        #[arg(long)]
        title: String,
        /// Note text (prompted when omitted)
        #[arg(long)]
        body: Option<String>,
        #[arg(long, default_value = "")]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: AddCommands) -> Result<()> {
    let ctx = get_context().await?;

    match command {
        AddCommands::Credential {
            label,
            username,
            secret,
            generate,
            length,
            category,
            json,
        } => {
            let (secret, generated) = match secret {
                Some(secret) => (secret, false),
                None if generate => (generate_secret(length)?, true),
                None => (Password::new().with_prompt("Secret").interact()?, false),
            };
            let fields = CredentialFields::new(label, username, secret).with_category(category);
            let record = ctx.vault.add_credential(fields).await?;

            if json {
                println!("{}", serde_json::json!({ "id": record.id, "generated": generated }));
            } else {
                println!("{} Credential '{}' added", "Success!".green(), record.label);
                println!("  ID: {}", record.id);
                if generated {
                    println!("  Generated secret: {}", record.secret);
                }
            }
        }
        AddCommands::Note {
            title,
            body,
            category,
            json,
        } => {
            let body = match body {
                Some(body) => body,
                None => Input::new().with_prompt("Note").interact_text()?,
            };
            let record = ctx
                .vault
                .add_note(NoteFields::new(title, body).with_category(category))
                .await?;

            if json {
                println!("{}", serde_json::json!({ "id": record.id }));
            } else {
                println!("{} Note '{}' added", "Success!".green(), record.title);
                println!("  ID: {}", record.id);
            }
        }
    }

    Ok(())
}
