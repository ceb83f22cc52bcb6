//! Setup command - choose how secrets are revealed

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Password;

use super::{get_context, pin_from_env};
use lockbox_core::AuthMethod;

#[derive(Subcommand)]
pub enum SetupCommands {
    /// Protect secrets with a 4-6 digit PIN (read from LOCKBOX_PIN or prompted)
    Pin,
    /// Protect secrets with the device fingerprint sensor
    Biometric,
    /// Remove the configured method
    None,
    /// Show the configured method
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: SetupCommands) -> Result<()> {
    let ctx = get_context().await?;

    match command {
        SetupCommands::Pin => {
            let pin = match pin_from_env() {
                Some(pin) => pin,
                None => Password::new()
                    .with_prompt("New PIN")
                    .with_confirmation("Confirm PIN", "PINs do not match")
                    .interact()?,
            };
            ctx.vault.setup_pin(&pin).await?;
            println!("{} PIN authentication enabled", "Success!".green());
        }
        SetupCommands::Biometric => {
            ctx.vault.setup_biometric().await?;
            println!("{} Fingerprint authentication enabled", "Success!".green());
        }
        SetupCommands::None => {
            ctx.vault.clear_auth_method().await?;
            println!("Authentication method removed. Secrets can no longer be revealed.");
        }
        SetupCommands::Status { json } => {
            let config = ctx.vault.auth_configuration().await?;
            let method = match config.method {
                AuthMethod::None => "none",
                AuthMethod::Pin => "pin",
                AuthMethod::Biometric => "biometric",
            };
            let pin_hashed = config.pin.as_ref().map(|p| p.is_hashed());

            if json {
                println!(
                    "{}",
                    serde_json::json!({ "method": method, "pin_hashed": pin_hashed })
                );
            } else {
                println!("{}", "Authentication".bold());
                println!("  Method: {}", method);
                if let Some(hashed) = pin_hashed {
                    if !hashed {
                        println!(
                            "  {}",
                            "PIN is stored in plain form. Run 'lb setup pin' to re-store it hashed.".yellow()
                        );
                    }
                }
                println!("  Database encrypted: {}", ctx.repository.is_encrypted());
            }
        }
    }

    Ok(())
}
