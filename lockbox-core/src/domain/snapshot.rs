//! Point-in-time view of the whole vault

use serde::{Deserialize, Serialize};

use super::credential::CredentialRecord;
use super::note::NoteRecord;

/// Ordered credentials and notes as currently persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub credentials: Vec<CredentialRecord>,
    pub notes: Vec<NoteRecord>,
}

impl VaultSnapshot {
    pub fn new(credentials: Vec<CredentialRecord>, notes: Vec<NoteRecord>) -> Self {
        Self { credentials, notes }
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty() && self.notes.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.credentials.len() + self.notes.len()
    }
}
