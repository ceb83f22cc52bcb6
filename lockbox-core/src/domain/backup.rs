//! Backup domain models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::credential::{CredentialFields, CredentialRecord};
use super::note::{NoteFields, NoteRecord};
use super::record::{Draft, RecordKind};

/// Format tag written into every artifact
pub const BACKUP_FORMAT: &str = "lockbox-backup";

/// Current artifact version
pub const BACKUP_VERSION: u32 = 1;

/// Version assigned to a bare JSON array of credentials
pub const LEGACY_BACKUP_VERSION: u32 = 0;

/// Portable serialized vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub format: String,
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    /// SHA-256 hex of the entries payload, see [`payload_checksum`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
}

/// One credential inside an artifact
///
/// Accepts the field names older exports used (`appname`, `password`).
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(alias = "appname")]
    pub label: String,
    pub username: String,
    #[serde(alias = "password")]
    pub secret: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl From<&CredentialRecord> for CredentialEntry {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: Some(record.id),
            label: record.label.clone(),
            username: record.username.clone(),
            secret: record.secret.clone(),
            category: record.category.clone(),
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }
}

impl From<CredentialEntry> for Draft<CredentialFields> {
    fn from(entry: CredentialEntry) -> Self {
        Draft {
            fields: CredentialFields {
                label: entry.label,
                username: entry.username,
                secret: entry.secret,
                category: entry.category,
            },
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// One note inside an artifact
#[derive(Clone, Serialize, Deserialize)]
pub struct NoteEntry {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for NoteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteEntry")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl From<&NoteRecord> for NoteEntry {
    fn from(record: &NoteRecord) -> Self {
        Self {
            id: Some(record.id),
            title: record.title.clone(),
            body: record.body.clone(),
            category: record.category.clone(),
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }
}

impl From<NoteEntry> for Draft<NoteFields> {
    fn from(entry: NoteEntry) -> Self {
        Draft {
            fields: NoteFields {
                title: entry.title,
                body: entry.body,
                category: entry.category,
            },
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Ids in artifacts are informational only; anything that is not a UUID
/// (older exports used numeric timestamps) reads as absent.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(|s| Uuid::parse_str(s).ok()))
}

/// Checksum over the entries payload
///
/// Computed on the `serde_json::Value` form so the result does not depend
/// on struct field order.
pub fn payload_checksum(credentials: &serde_json::Value, notes: &serde_json::Value) -> String {
    let payload = serde_json::json!({
        "credentials": credentials,
        "notes": notes,
    });
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Why a single artifact entry was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum RecordErrorReason {
    /// The entry could not be decoded
    Format(String),
    /// The entry decoded but a required field was empty
    Validation(String),
}

/// Per-entry import failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    pub kind: RecordKind,
    /// Position of the entry within its list in the artifact
    pub index: usize,
    pub reason: RecordErrorReason,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RecordErrorReason::Format(msg) => {
                write!(f, "{} #{}: format error: {}", self.kind, self.index, msg)
            }
            RecordErrorReason::Validation(msg) => {
                write!(f, "{} #{}: validation error: {}", self.kind, self.index, msg)
            }
        }
    }
}

/// Outcome of merging an artifact into the vault
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub credentials_imported: usize,
    pub notes_imported: usize,
    pub errors: Vec<RecordError>,
}

impl ImportResult {
    pub fn total_imported(&self) -> usize {
        self.credentials_imported + self.notes_imported
    }
}

/// Metadata for a backup file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Backup filename (e.g., "lockbox-2025-01-15T10-30-00-123456.json")
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

impl BackupMetadata {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            created_at,
            size_bytes,
        }
    }

    /// Format size for human display
    pub fn size_display(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Human-readable byte count (binary units)
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_display() {
        let meta = BackupMetadata::new("lockbox.json", Utc::now(), 1536);
        assert_eq!(meta.size_display(), "1.5 KB");

        let meta = BackupMetadata::new("lockbox.json", Utc::now(), 512);
        assert_eq!(meta.size_display(), "512 bytes");
    }

    #[test]
    fn test_legacy_field_names() {
        let entry: CredentialEntry = serde_json::from_value(serde_json::json!({
            "id": 1700000000000u64,
            "appname": "Mail",
            "username": "me",
            "password": "pw",
        }))
        .unwrap();
        assert_eq!(entry.label, "Mail");
        assert_eq!(entry.secret, "pw");
        assert!(entry.id.is_none());
        assert_eq!(entry.category, "");

        let note: NoteEntry = serde_json::from_value(serde_json::json!({
            "title": "T",
            "content": "B",
        }))
        .unwrap();
        assert_eq!(note.body, "B");
    }

    #[test]
    fn test_checksum_ignores_key_order() {
        let a = serde_json::json!([{"label": "x", "username": "y"}]);
        let b: serde_json::Value =
            serde_json::from_str(r#"[{"username": "y", "label": "x"}]"#).unwrap();
        let notes = serde_json::json!([]);
        assert_eq!(payload_checksum(&a, &notes), payload_checksum(&b, &notes));
    }

    #[test]
    fn test_record_error_display() {
        let err = RecordError {
            kind: RecordKind::Credential,
            index: 2,
            reason: RecordErrorReason::Validation("label is required".into()),
        };
        assert_eq!(err.to_string(), "credential #2: validation error: label is required");
    }
}
