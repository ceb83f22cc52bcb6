//! Record kind abstraction shared by credentials and notes

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::Visibility;
use super::result::{Error, Result};

/// Placeholder rendered instead of a sensitive value while the vault is hidden
pub const MASK: &str = "********";

/// The two record kinds held by the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Credential,
    Note,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type stored by [`crate::services::RecordStore`]
///
/// Each implementor fixes its field set, which fields are required and
/// which single field is sensitive.
pub trait Record: Clone + Send + Sync + fmt::Debug + 'static {
    /// Mutable fields supplied on create and update
    type Fields: Clone + Send + Sync + fmt::Debug + 'static;

    const KIND: RecordKind;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Copy of the current mutable fields
    fn fields(&self) -> Self::Fields;

    /// Build a record from its parts
    fn assemble(
        id: Uuid,
        fields: Self::Fields,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self;

    /// Reject field sets with an empty required field
    fn validate(fields: &Self::Fields) -> Result<()>;

    /// The value hidden while the gate is closed
    fn sensitive_value(&self) -> &str;

    /// Copy of this record with the sensitive value replaced by [`MASK`]
    fn masked(&self) -> Self;

    /// Replace the mutable fields, keeping id and creation time
    fn with_fields(&self, fields: Self::Fields) -> Self {
        Self::assemble(self.id(), fields, self.created_at(), Utc::now())
    }
}

/// Require a non-blank value
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Field set plus optional timestamps carried over from a backup
#[derive(Debug, Clone)]
pub struct Draft<F> {
    pub fields: F,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<F> Draft<F> {
    pub fn new(fields: F) -> Self {
        Self {
            fields,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Result of a list call
///
/// Holds the records in insertion order and the visibility that was in
/// effect when the listing was taken.
#[derive(Debug, Clone)]
pub struct Listing<R> {
    records: Vec<R>,
    visibility: Visibility,
}

impl<R: Record> Listing<R> {
    pub fn new(records: Vec<R>, visibility: Visibility) -> Self {
        Self {
            records,
            visibility,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Canonical records, sensitive values included
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Records as they may be rendered under the captured visibility
    pub fn for_display(&self) -> Vec<R> {
        if self.visibility.is_revealed() {
            self.records.clone()
        } else {
            self.records.iter().map(Record::masked).collect()
        }
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

impl<R> IntoIterator for Listing<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a Listing<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("label", "").is_err());
        assert!(require("label", "   ").is_err());
        assert!(require("label", "x").is_ok());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(RecordKind::Credential.to_string(), "credential");
        assert_eq!(RecordKind::Note.as_str(), "note");
    }
}
