//! Backup codec - serializes the vault and merges artifacts back
//!
//! Export produces a versioned JSON document, optionally sealed with a
//! passphrase. Import rejects the artifact wholesale when its envelope is
//! unreadable, and otherwise decodes and validates each entry on its own
//! so that one bad entry does not block the rest.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::domain::result::{Error, Result};
use crate::domain::{
    payload_checksum, BackupArtifact, CredentialEntry, CredentialFields, CredentialRecord, Draft,
    ImportResult, NoteEntry, NoteFields, NoteRecord, Record, RecordError, RecordErrorReason,
    RecordKind, VaultSnapshot, BACKUP_FORMAT, BACKUP_VERSION, LEGACY_BACKUP_VERSION,
};
use crate::services::encryption::EncryptionService;
use crate::services::store::RecordStore;

/// Entries read from an artifact, not yet written to the store
#[derive(Debug, Default)]
pub struct DecodedArtifact {
    pub version: u32,
    pub credentials: Vec<Draft<CredentialFields>>,
    pub notes: Vec<Draft<NoteFields>>,
    pub errors: Vec<RecordError>,
}

#[derive(Debug, Clone, Default)]
pub struct BackupCodec {
    encryption: EncryptionService,
}

impl BackupCodec {
    pub fn new(encryption: EncryptionService) -> Self {
        Self { encryption }
    }

    /// Build an artifact from a snapshot
    pub fn export(&self, snapshot: &VaultSnapshot, include_notes: bool) -> Result<BackupArtifact> {
        let credentials: Vec<CredentialEntry> =
            snapshot.credentials.iter().map(CredentialEntry::from).collect();
        let notes: Vec<NoteEntry> = if include_notes {
            snapshot.notes.iter().map(NoteEntry::from).collect()
        } else {
            Vec::new()
        };

        let checksum = payload_checksum(&to_value(&credentials)?, &to_value(&notes)?);

        Ok(BackupArtifact {
            format: BACKUP_FORMAT.to_string(),
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            checksum: Some(checksum),
            credentials,
            notes,
        })
    }

    /// Serialize an artifact to pretty-printed JSON
    pub fn encode(artifact: &BackupArtifact) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(artifact)
            .map_err(|e| Error::storage(format!("Failed to serialize backup: {}", e)))
    }

    /// Encrypt encoded artifact bytes with a passphrase
    pub async fn seal(&self, plain: Vec<u8>, passphrase: String) -> Result<Vec<u8>> {
        let encryption = self.encryption.clone();
        tokio::task::spawn_blocking(move || encryption.seal(&plain, &passphrase))
            .await
            .map_err(|e| Error::storage(format!("Encryption task failed: {}", e)))?
    }

    /// Parse artifact bytes into drafts and per-entry errors
    pub async fn decode(&self, bytes: Vec<u8>, passphrase: Option<String>) -> Result<DecodedArtifact> {
        let plain = match EncryptionService::detect(&bytes) {
            Some(sealed) => {
                let passphrase = passphrase
                    .ok_or_else(|| Error::format("Backup is encrypted; a passphrase is required"))?;
                tokio::task::spawn_blocking(move || EncryptionService::open(&sealed, &passphrase))
                    .await
                    .map_err(|e| Error::storage(format!("Decryption task failed: {}", e)))??
            }
            None => bytes,
        };
        decode_plain(&plain)
    }

    /// Decode an artifact and insert its valid entries as new records
    ///
    /// Each kind is committed in one storage transaction, credentials first.
    /// When the notes transaction fails after credentials were committed,
    /// the returned storage error states how many credentials were kept.
    pub async fn import(
        &self,
        bytes: Vec<u8>,
        passphrase: Option<String>,
        credentials: &RecordStore<CredentialRecord>,
        notes: &RecordStore<NoteRecord>,
    ) -> Result<ImportResult> {
        let decoded = self.decode(bytes, passphrase).await?;
        tracing::debug!(
            version = decoded.version,
            credentials = decoded.credentials.len(),
            notes = decoded.notes.len(),
            rejected = decoded.errors.len(),
            "decoded backup"
        );

        let credentials_imported = credentials.create_drafts(decoded.credentials).await?.len();
        let notes_imported = match notes.create_drafts(decoded.notes).await {
            Ok(created) => created.len(),
            Err(Error::Storage(message)) if credentials_imported > 0 => {
                return Err(Error::storage(format!(
                    "{} credential(s) were imported but notes could not be saved: {}",
                    credentials_imported, message
                )))
            }
            Err(e) => return Err(e),
        };

        Ok(ImportResult {
            credentials_imported,
            notes_imported,
            errors: decoded.errors,
        })
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::storage(format!("Failed to serialize backup: {}", e)))
}

/// Decode an unsealed artifact
pub fn decode_plain(bytes: &[u8]) -> Result<DecodedArtifact> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::format(format!("Backup is not valid JSON: {}", e)))?;

    let (version, credentials, notes) = match root {
        // Older exports were a bare list of credentials
        Value::Array(items) => (LEGACY_BACKUP_VERSION, items, Vec::new()),
        Value::Object(mut map) => {
            match map.get("format").and_then(Value::as_str) {
                Some(BACKUP_FORMAT) => {}
                Some(other) => {
                    return Err(Error::format(format!("Unrecognized backup format: {}", other)))
                }
                None => return Err(Error::format("Backup has no format tag")),
            }
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::format("Backup has no version"))?;
            if version != u64::from(BACKUP_VERSION) {
                return Err(Error::format(format!("Unsupported backup version: {}", version)));
            }

            let credentials = take_list(&mut map, "credentials")?;
            let notes = take_list(&mut map, "notes")?;

            if let Some(expected) = map.get("checksum").and_then(Value::as_str) {
                let actual = payload_checksum(
                    &Value::Array(credentials.clone()),
                    &Value::Array(notes.clone()),
                );
                if !actual.eq_ignore_ascii_case(expected) {
                    return Err(Error::format("Backup checksum mismatch"));
                }
            }

            (BACKUP_VERSION, credentials, notes)
        }
        _ => return Err(Error::format("Backup must be a JSON object or array")),
    };

    let mut decoded = DecodedArtifact {
        version,
        ..DecodedArtifact::default()
    };
    decoded.credentials = decode_entries::<CredentialEntry, CredentialRecord>(
        credentials,
        RecordKind::Credential,
        &mut decoded.errors,
    );
    decoded.notes =
        decode_entries::<NoteEntry, NoteRecord>(notes, RecordKind::Note, &mut decoded.errors);
    Ok(decoded)
}

fn take_list(map: &mut serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::format(format!("Backup field '{}' must be a list", key))),
    }
}

fn decode_entries<E, R>(
    items: Vec<Value>,
    kind: RecordKind,
    errors: &mut Vec<RecordError>,
) -> Vec<Draft<R::Fields>>
where
    E: serde::de::DeserializeOwned + Into<Draft<R::Fields>>,
    R: Record,
{
    let mut drafts = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let draft: Draft<R::Fields> = match serde_json::from_value::<E>(item) {
            Ok(entry) => entry.into(),
            Err(e) => {
                errors.push(RecordError {
                    kind,
                    index,
                    reason: RecordErrorReason::Format(e.to_string()),
                });
                continue;
            }
        };
        if let Err(e) = R::validate(&draft.fields) {
            let message = match e {
                Error::Validation(message) => message,
                other => other.to_string(),
            };
            errors.push(RecordError {
                kind,
                index,
                reason: RecordErrorReason::Validation(message),
            });
            continue;
        }
        drafts.push(draft);
    }
    drafts
}
