//! Lockbox Core - local vault for credentials and secure notes
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Records, authentication values, backup artifacts, errors
//! - **ports**: Trait definitions for external dependencies (storage, secrets, biometrics, transport)
//! - **services**: Record store, visibility gate, backup codec and the `Vault` facade
//! - **adapters**: Concrete implementations (DuckDB, JSON secret file, filesystem, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use rand::Rng;

use adapters::duckdb::DuckDbRepository;
use adapters::filesystem::FileArtifactTransport;
use adapters::secrets::FileSecretStore;
use config::Config;
use ports::{BiometricPrompt, SecretStore};
use services::{Authenticator, BackupCodec, EncryptionService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{
    AuthMethod, BackupMetadata, Challenge, CredentialFields, CredentialRecord, ImportResult,
    Listing, NoteFields, NoteRecord, Record, RecordKind, Visibility,
};
pub use services::{ExportOptions, ExportReceipt, Session, Vault};

pub const DB_FILE: &str = "vault.duckdb";
pub const LOCK_FILE: &str = "vault.lock";

/// Secret store key holding the hex-encoded database encryption key
pub const DB_KEY_SECRET: &str = "vault_db_key";

/// Main context for Lockbox operations
///
/// Opens a vault directory and wires the file-backed adapters into a
/// [`Vault`]. Holds an exclusive lock on the directory for its lifetime.
pub struct LockboxContext {
    pub config: Config,
    pub vault_dir: PathBuf,
    pub repository: Arc<DuckDbRepository>,
    pub backups: FileArtifactTransport,
    pub vault: Vault,
    _lock: File,
}

impl LockboxContext {
    /// Open (or create) the vault in `vault_dir`
    ///
    /// Fails with a storage error when another process has the vault open.
    pub async fn open(vault_dir: &Path, biometric: Arc<dyn BiometricPrompt>) -> Result<Self> {
        std::fs::create_dir_all(vault_dir)?;
        let lock = acquire_lock(vault_dir)?;
        let config = Config::load(vault_dir)?;

        let secrets = Arc::new(FileSecretStore::new(vault_dir));
        let db_path = vault_dir.join(DB_FILE);
        let key = database_key(secrets.as_ref(), &config, &db_path).await?;

        let open_path = db_path.clone();
        let repository = tokio::task::spawn_blocking(move || -> Result<DuckDbRepository> {
            let repository = DuckDbRepository::new(&open_path, key.as_deref())?;
            repository.ensure_schema()?;
            Ok(repository)
        })
        .await
        .map_err(|e| Error::storage(format!("Database task failed: {}", e)))??;
        let repository = Arc::new(repository);

        let backups = FileArtifactTransport::new(vault_dir, config.max_backups);
        let authenticator = Authenticator::new(secrets, biometric)
            .with_prompt_message(config.biometric_prompt.clone());
        let codec = BackupCodec::new(EncryptionService::new(config.backup_kdf.clone()));
        let vault = Vault::new(Arc::clone(&repository), authenticator, Arc::new(backups.clone()))
            .with_backup_codec(codec);

        tracing::debug!(encrypted = repository.is_encrypted(), "vault opened");

        Ok(Self {
            config,
            vault_dir: vault_dir.to_path_buf(),
            repository,
            backups,
            vault,
            _lock: lock,
        })
    }
}

fn acquire_lock(vault_dir: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(vault_dir.join(LOCK_FILE))?;
    file.try_lock_exclusive()
        .map_err(|_| Error::storage("Vault is already open in another process"))?;
    Ok(file)
}

/// Key for the vault database, generating one for a fresh encrypted vault
///
/// An existing database without a stored key predates encryption and is
/// opened as is.
async fn database_key(secrets: &dyn SecretStore, config: &Config, db_path: &Path) -> Result<Option<String>> {
    if let Some(key) = secrets.get_secret(DB_KEY_SECRET).await? {
        return Ok(Some(key));
    }
    if !config.encrypt_database {
        return Ok(None);
    }
    if db_path.exists() {
        tracing::warn!("existing vault database has no encryption key, opening unencrypted");
        return Ok(None);
    }

    let bytes: [u8; 32] = rand::thread_rng().gen();
    let key = hex::encode(bytes);
    secrets.set_secret(DB_KEY_SECRET, &key).await?;
    Ok(Some(key))
}
