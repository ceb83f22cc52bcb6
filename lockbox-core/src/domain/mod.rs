//! Core domain entities
//!
//! All vault entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod auth;
mod backup;
mod credential;
mod encryption;
mod note;
mod record;
pub mod result;
mod snapshot;

pub use auth::{
    AuthConfiguration, AuthFailure, AuthMethod, Challenge, PinVerifier, Visibility,
};
pub use backup::{
    format_size, payload_checksum, BackupArtifact, BackupMetadata, CredentialEntry, ImportResult,
    NoteEntry, RecordError, RecordErrorReason, BACKUP_FORMAT, BACKUP_VERSION, LEGACY_BACKUP_VERSION,
};
pub use credential::{generate_secret, CredentialFields, CredentialRecord, DEFAULT_SECRET_LENGTH};
pub use encryption::{Argon2Params, SealedArtifact, SEALED_FORMAT, SEALED_VERSION};
pub use note::{NoteFields, NoteRecord};
pub use record::{Draft, Listing, Record, RecordKind, MASK};
pub use snapshot::VaultSnapshot;
