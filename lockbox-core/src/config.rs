//! Configuration management
//!
//! Settings live in `<vault>/settings.json`:
//! ```json
//! {
//!   "app": {
//!     "biometricPrompt": "Authenticate to view passwords",
//!     "maxBackups": 10,
//!     "encryptDatabase": true,
//!     "backupKdf": { "timeCost": 3, "memoryCost": 65536, "parallelism": 4, "hashLen": 32 }
//!   }
//! }
//! ```
//! Keys this crate does not manage are kept when saving.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::Argon2Params;
use crate::services::gate::DEFAULT_BIOMETRIC_PROMPT;

pub const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    biometric_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_backups: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encrypt_database: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backup_kdf: Option<KdfSettings>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KdfSettings {
    time_cost: u32,
    memory_cost: u32,
    parallelism: u32,
    #[serde(default = "default_hash_len")]
    hash_len: u32,
}

fn default_hash_len() -> u32 {
    32
}

impl From<KdfSettings> for Argon2Params {
    fn from(kdf: KdfSettings) -> Self {
        Self {
            time_cost: kdf.time_cost,
            memory_cost: kdf.memory_cost,
            parallelism: kdf.parallelism,
            hash_len: kdf.hash_len,
        }
    }
}

impl From<&Argon2Params> for KdfSettings {
    fn from(params: &Argon2Params) -> Self {
        Self {
            time_cost: params.time_cost,
            memory_cost: params.memory_cost,
            parallelism: params.parallelism,
            hash_len: params.hash_len,
        }
    }
}

/// Lockbox configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub biometric_prompt: String,
    /// Keep at most this many files in `backups/`
    pub max_backups: Option<usize>,
    pub encrypt_database: bool,
    pub backup_kdf: Argon2Params,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            biometric_prompt: DEFAULT_BIOMETRIC_PROMPT.to_string(),
            max_backups: None,
            encrypt_database: true,
            backup_kdf: Argon2Params::default(),
        }
    }
}

impl Config {
    /// Load config from the vault directory
    ///
    /// A missing or unreadable settings file yields defaults. Retention and
    /// database encryption can be overridden with `LOCKBOX_MAX_BACKUPS` and
    /// `LOCKBOX_ENCRYPT_DATABASE`.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let raw = read_settings(vault_dir)?;
        let defaults = Self::default();

        let max_backups = match std::env::var("LOCKBOX_MAX_BACKUPS").ok() {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(_) => {
                    tracing::warn!("ignoring invalid LOCKBOX_MAX_BACKUPS");
                    raw.app.max_backups
                }
            },
            None => raw.app.max_backups,
        };

        let encrypt_database = match std::env::var("LOCKBOX_ENCRYPT_DATABASE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.encrypt_database.unwrap_or(defaults.encrypt_database),
        };

        Ok(Self {
            biometric_prompt: raw
                .app
                .biometric_prompt
                .filter(|prompt| !prompt.trim().is_empty())
                .unwrap_or(defaults.biometric_prompt),
            max_backups,
            encrypt_database,
            backup_kdf: raw.app.backup_kdf.map(Into::into).unwrap_or(defaults.backup_kdf),
        })
    }

    /// Save config to the vault directory
    /// Preserves other settings this crate doesn't manage
    pub fn save(&self, vault_dir: &Path) -> Result<()> {
        let mut settings = read_settings(vault_dir)?;

        settings.app.biometric_prompt = Some(self.biometric_prompt.clone());
        settings.app.max_backups = self.max_backups;
        settings.app.encrypt_database = Some(self.encrypt_database);
        settings.app.backup_kdf = Some(KdfSettings::from(&self.backup_kdf));

        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| Error::storage(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(vault_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }
}

fn read_settings(vault_dir: &Path) -> Result<SettingsFile> {
    let settings_path = vault_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("settings.json is malformed, using defaults: {}", e);
        SettingsFile::default()
    }))
}
