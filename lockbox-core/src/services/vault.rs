//! Vault facade - the single entry point for hosts
//!
//! Coordinates the two record stores, the visibility gate and the backup
//! codec. Errors from the components pass through unchanged.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{
    AuthConfiguration, Challenge, CredentialFields, CredentialRecord, ImportResult, Listing,
    NoteFields, NoteRecord, Visibility, VaultSnapshot,
};
use crate::ports::{ArtifactLocation, ArtifactTransport, RecordStorage};
use crate::services::backup::BackupCodec;
use crate::services::gate::{Authenticator, Session, VisibilityGate};
use crate::services::store::RecordStore;

/// What to put in an exported backup
#[derive(Clone)]
pub struct ExportOptions {
    pub include_notes: bool,
    /// Seal the artifact with this passphrase
    pub passphrase: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_notes: true,
            passphrase: None,
        }
    }
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("include_notes", &self.include_notes)
            .field("encrypted", &self.passphrase.is_some())
            .finish()
    }
}

impl ExportOptions {
    pub fn encrypted(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Some(passphrase.into()),
            ..Self::default()
        }
    }

    pub fn without_notes(mut self) -> Self {
        self.include_notes = false;
        self
    }
}

/// Outcome of an export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReceipt {
    pub location: ArtifactLocation,
    pub credentials: usize,
    pub notes: usize,
    pub encrypted: bool,
    pub size_bytes: usize,
}

pub struct Vault {
    credentials: RecordStore<CredentialRecord>,
    notes: RecordStore<NoteRecord>,
    gate: Arc<VisibilityGate>,
    authenticator: Arc<Authenticator>,
    codec: BackupCodec,
    transport: Arc<dyn ArtifactTransport>,
}

impl Vault {
    pub fn new<S>(storage: Arc<S>, authenticator: Authenticator, transport: Arc<dyn ArtifactTransport>) -> Self
    where
        S: RecordStorage<CredentialRecord> + RecordStorage<NoteRecord> + 'static,
    {
        let credential_storage: Arc<dyn RecordStorage<CredentialRecord>> = storage.clone();
        let note_storage: Arc<dyn RecordStorage<NoteRecord>> = storage;
        Self {
            credentials: RecordStore::new(credential_storage),
            notes: RecordStore::new(note_storage),
            gate: Arc::new(VisibilityGate::new()),
            authenticator: Arc::new(authenticator),
            codec: BackupCodec::default(),
            transport,
        }
    }

    pub fn with_backup_codec(mut self, codec: BackupCodec) -> Self {
        self.codec = codec;
        self
    }

    // === Credentials ===

    pub async fn add_credential(&self, fields: CredentialFields) -> Result<CredentialRecord> {
        self.credentials.create(fields).await
    }

    pub async fn edit_credential(&self, id: Uuid, fields: CredentialFields) -> Result<CredentialRecord> {
        self.credentials.update(id, fields).await
    }

    pub async fn delete_credential(&self, id: Uuid) -> Result<()> {
        self.credentials.delete(id).await
    }

    pub async fn get_credential(&self, id: Uuid) -> Result<CredentialRecord> {
        self.credentials.get(id).await
    }

    pub async fn list_credentials(&self) -> Result<Listing<CredentialRecord>> {
        let records = self.credentials.list().await?;
        Ok(Listing::new(records, self.gate.current().await))
    }

    // === Notes ===

    pub async fn add_note(&self, fields: NoteFields) -> Result<NoteRecord> {
        self.notes.create(fields).await
    }

    pub async fn edit_note(&self, id: Uuid, fields: NoteFields) -> Result<NoteRecord> {
        self.notes.update(id, fields).await
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<()> {
        self.notes.delete(id).await
    }

    pub async fn get_note(&self, id: Uuid) -> Result<NoteRecord> {
        self.notes.get(id).await
    }

    pub async fn list_notes(&self) -> Result<Listing<NoteRecord>> {
        let records = self.notes.list().await?;
        Ok(Listing::new(records, self.gate.current().await))
    }

    /// Fresh copy of everything currently stored
    pub async fn snapshot(&self) -> Result<VaultSnapshot> {
        Ok(VaultSnapshot::new(
            self.credentials.list().await?,
            self.notes.list().await?,
        ))
    }

    // === Visibility ===

    pub async fn request_reveal(&self, challenge: &Challenge) -> Result<Visibility> {
        self.gate.reveal(&self.authenticator, challenge).await
    }

    pub async fn hide(&self) -> Visibility {
        self.gate.hide().await
    }

    pub async fn visibility(&self) -> Visibility {
        self.gate.current().await
    }

    /// Handle over this vault's gate for the UI layer
    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.gate), Arc::clone(&self.authenticator))
    }

    // === Authentication setup ===

    pub async fn auth_configuration(&self) -> Result<AuthConfiguration> {
        self.authenticator.configuration().await
    }

    /// Switch to PIN authentication. The gate is closed afterwards.
    pub async fn setup_pin(&self, pin: &str) -> Result<()> {
        self.authenticator.setup_pin(pin).await?;
        self.gate.hide().await;
        Ok(())
    }

    /// Switch to biometric authentication. The gate is closed afterwards.
    pub async fn setup_biometric(&self) -> Result<()> {
        self.authenticator.setup_biometric().await?;
        self.gate.hide().await;
        Ok(())
    }

    pub async fn clear_auth_method(&self) -> Result<()> {
        self.authenticator.clear_method().await?;
        self.gate.hide().await;
        Ok(())
    }

    // === Backup ===

    /// Serialize the vault and hand it to the artifact transport
    pub async fn export_backup(&self, options: ExportOptions) -> Result<ExportReceipt> {
        let snapshot = self.snapshot().await?;
        let artifact = self.codec.export(&snapshot, options.include_notes)?;
        let credentials = artifact.credentials.len();
        let notes = artifact.notes.len();

        let mut bytes = BackupCodec::encode(&artifact)?;
        let encrypted = options.passphrase.is_some();
        if let Some(passphrase) = options.passphrase {
            bytes = self.codec.seal(bytes, passphrase).await?;
        }
        let size_bytes = bytes.len();

        let location = self.transport.write_artifact(bytes).await?;
        tracing::debug!(credentials, notes, encrypted, "backup exported");

        Ok(ExportReceipt {
            location,
            credentials,
            notes,
            encrypted,
            size_bytes,
        })
    }

    /// Read an artifact from the transport and merge it into the vault
    pub async fn import_backup(
        &self,
        location: &ArtifactLocation,
        passphrase: Option<&str>,
    ) -> Result<ImportResult> {
        let bytes = self.transport.read_artifact(location).await?;
        self.import_bytes(bytes, passphrase).await
    }

    /// Merge artifact bytes obtained by the host directly
    pub async fn import_bytes(&self, bytes: Vec<u8>, passphrase: Option<&str>) -> Result<ImportResult> {
        let result = self
            .codec
            .import(
                bytes,
                passphrase.map(str::to_string),
                &self.credentials,
                &self.notes,
            )
            .await?;
        tracing::debug!(
            credentials = result.credentials_imported,
            notes = result.notes_imported,
            rejected = result.errors.len(),
            "backup imported"
        );
        Ok(result)
    }
}
