//! List command - show records, masked unless revealed

use anyhow::Result;
use clap::{Args, Subcommand};

use super::{build_challenge, get_context};
use crate::output;
use lockbox_core::{LockboxContext, Visibility};

#[derive(Args)]
pub struct ListOptions {
    /// Authenticate and show secrets in plaintext (PIN read from LOCKBOX_PIN or prompted)
    #[arg(long)]
    reveal: bool,
    /// Only show records in this category
    #[arg(long)]
    category: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List credentials
    Credentials(ListOptions),
    /// List notes
    Notes(ListOptions),
}

async fn reveal_if_requested(ctx: &LockboxContext, options: &ListOptions) -> Result<()> {
    if options.reveal {
        let challenge = build_challenge(&ctx.vault).await?;
        ctx.vault.request_reveal(&challenge).await?;
    }
    Ok(())
}

fn in_category(category: &str, filter: &Option<String>) -> bool {
    filter
        .as_deref()
        .map(|f| category.eq_ignore_ascii_case(f))
        .unwrap_or(true)
}

fn print_hidden_hint(visibility: Visibility, json: bool) {
    if !json && visibility == Visibility::Hidden {
        output::hint("Secrets are hidden. Use --reveal to show them.");
    }
}

pub async fn run(command: ListCommands) -> Result<()> {
    let ctx = get_context().await?;

    match command {
        ListCommands::Credentials(options) => {
            reveal_if_requested(&ctx, &options).await?;
            let listing = ctx.vault.list_credentials().await?;
            let visibility = listing.visibility();
            let records: Vec<_> = listing
                .for_display()
                .into_iter()
                .filter(|c| in_category(&c.category, &options.category))
                .collect();

            if options.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "visibility": visibility,
                        "credentials": records,
                    }))?
                );
            } else if records.is_empty() {
                println!("No credentials found.");
            } else {
                let mut table = output::table(&["ID", "Label", "Username", "Secret", "Category"]);
                for c in records {
                    table.add_row(vec![c.id.to_string(), c.label, c.username, c.secret, c.category]);
                }
                println!("{}", table);
                print_hidden_hint(visibility, options.json);
            }
        }
        ListCommands::Notes(options) => {
            reveal_if_requested(&ctx, &options).await?;
            let listing = ctx.vault.list_notes().await?;
            let visibility = listing.visibility();
            let records: Vec<_> = listing
                .for_display()
                .into_iter()
                .filter(|n| in_category(&n.category, &options.category))
                .collect();

            if options.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "visibility": visibility,
                        "notes": records,
                    }))?
                );
            } else if records.is_empty() {
                println!("No notes found.");
            } else {
                let mut table = output::table(&["ID", "Title", "Body", "Category", "Updated"]);
                for n in records {
                    table.add_row(vec![
                        n.id.to_string(),
                        n.title,
                        n.body,
                        n.category,
                        n.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    ]);
                }
                println!("{}", table);
                print_hidden_hint(visibility, options.json);
            }
        }
    }

    Ok(())
}
