//! CLI command implementations

pub mod add;
pub mod backup;
pub mod delete;
pub mod edit;
pub mod list;
pub mod logs;
pub mod setup;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::Password;
use uuid::Uuid;

use lockbox_core::adapters::biometric::NoBiometricHardware;
use lockbox_core::services::{EntryPoint, EventLog, LogEvent};
use lockbox_core::{AuthMethod, Challenge, LockboxContext, Vault};

/// Get the event log for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<EventLog> {
    let vault_dir = get_vault_dir().ok()?;
    std::fs::create_dir_all(&vault_dir).ok()?;
    EventLog::new(&vault_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<EventLog>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Record one event per command; failures keep only the error code
pub fn log_outcome(logger: &Option<EventLog>, command: &str, result: &Result<()>) {
    let event = match result {
        Ok(()) => LogEvent::new("command_executed").with_command(command),
        Err(e) => {
            let event = LogEvent::new("command_failed").with_command(command);
            match e.downcast_ref::<lockbox_core::Error>() {
                Some(core) => event.with_error(core),
                None => event,
            }
        }
    };
    log_event(logger, event);
}

/// Get the vault directory from environment or default
pub fn get_vault_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("LOCKBOX_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".lockbox"))
        .context("Could not find home directory; set LOCKBOX_DIR")
}

/// Open the vault context
pub async fn get_context() -> Result<LockboxContext> {
    let vault_dir = get_vault_dir()?;
    LockboxContext::open(&vault_dir, Arc::new(NoBiometricHardware))
        .await
        .with_context(|| format!("Failed to open vault at {}", vault_dir.display()))
}

pub fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid record id: {}", id))
}

/// Environment variable a non-interactive caller can use to supply the PIN
///
/// The PIN is never accepted as a command-line argument.
pub const PIN_ENV: &str = "LOCKBOX_PIN";

/// PIN from `LOCKBOX_PIN`, if set and non-empty
pub fn pin_from_env() -> Option<String> {
    std::env::var(PIN_ENV).ok().filter(|pin| !pin.is_empty())
}

/// Build the reveal challenge for the configured method
///
/// Prompts for the PIN when `LOCKBOX_PIN` is not set.
pub async fn build_challenge(vault: &Vault) -> Result<Challenge> {
    let config = vault.auth_configuration().await?;
    match config.method {
        AuthMethod::Pin => {
            let pin = match pin_from_env() {
                Some(pin) => pin,
                None => Password::new().with_prompt("PIN").interact()?,
            };
            Ok(Challenge::Pin(pin))
        }
        AuthMethod::Biometric => Ok(Challenge::Biometric),
        AuthMethod::None => {
            anyhow::bail!("No authentication method configured. Run 'lb setup pin' first.")
        }
    }
}
