//! Record store - CRUD over one record kind
//!
//! Wraps a [`RecordStorage`] port with validation, id assignment and write
//! serialization. Mutations take the write side of a per-store lock and
//! listings the read side, so a listing never observes a half-applied
//! write and two writers never interleave.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Draft, Record};
use crate::ports::RecordStorage;

pub struct RecordStore<R: Record> {
    storage: Arc<dyn RecordStorage<R>>,
    lock: RwLock<()>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(storage: Arc<dyn RecordStorage<R>>) -> Self {
        Self {
            storage,
            lock: RwLock::new(()),
        }
    }

    /// Validate, assign a fresh id and persist
    pub async fn create(&self, fields: R::Fields) -> Result<R> {
        R::validate(&fields)?;
        let now = Utc::now();
        let record = R::assemble(Uuid::new_v4(), fields, now, now);

        let _guard = self.lock.write().await;
        self.storage.insert(vec![record.clone()]).await?;
        tracing::debug!(kind = %R::KIND, id = %record.id(), "record created");
        Ok(record)
    }

    /// Create several records in one storage transaction
    ///
    /// Every entry is validated first; one invalid entry rejects the batch.
    pub async fn create_many(&self, fields: Vec<R::Fields>) -> Result<Vec<R>> {
        self.create_drafts(fields.into_iter().map(Draft::new).collect())
            .await
    }

    /// Like [`Self::create_many`] but keeps timestamps supplied by the caller
    pub async fn create_drafts(&self, drafts: Vec<Draft<R::Fields>>) -> Result<Vec<R>> {
        for draft in &drafts {
            R::validate(&draft.fields)?;
        }
        let now = Utc::now();
        let records: Vec<R> = drafts
            .into_iter()
            .map(|draft| {
                let created_at = draft.created_at.unwrap_or(now);
                let updated_at = draft.updated_at.unwrap_or(created_at);
                R::assemble(Uuid::new_v4(), draft.fields, created_at, updated_at)
            })
            .collect();

        if records.is_empty() {
            return Ok(records);
        }

        let _guard = self.lock.write().await;
        self.storage.insert(records.clone()).await?;
        tracing::debug!(kind = %R::KIND, count = records.len(), "records created");
        Ok(records)
    }

    /// Overwrite all mutable fields of an existing record
    pub async fn update(&self, id: Uuid, fields: R::Fields) -> Result<R> {
        R::validate(&fields)?;

        let _guard = self.lock.write().await;
        let current = self
            .storage
            .get(id)
            .await?
            .ok_or_else(|| not_found::<R>(id))?;
        let updated = current.with_fields(fields);
        if !self.storage.update(updated.clone()).await? {
            return Err(not_found::<R>(id));
        }
        tracing::debug!(kind = %R::KIND, id = %id, "record updated");
        Ok(updated)
    }

    /// Remove a record; deleting an unknown id is an error
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let _guard = self.lock.write().await;
        if !self.storage.delete(id).await? {
            return Err(not_found::<R>(id));
        }
        tracing::debug!(kind = %R::KIND, id = %id, "record deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<R> {
        let _guard = self.lock.read().await;
        self.storage
            .get(id)
            .await?
            .ok_or_else(|| not_found::<R>(id))
    }

    /// Fresh read of all records in insertion order
    pub async fn list(&self) -> Result<Vec<R>> {
        let _guard = self.lock.read().await;
        self.storage.list().await
    }
}

fn not_found<R: Record>(id: Uuid) -> Error {
    Error::not_found(format!("{} {}", R::KIND, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::{CredentialFields, CredentialRecord, NoteFields, NoteRecord};

    fn stores() -> (RecordStore<CredentialRecord>, RecordStore<NoteRecord>) {
        let repo = DuckDbRepository::in_memory().unwrap();
        repo.ensure_schema().unwrap();
        let repo = Arc::new(repo);
        (RecordStore::new(repo.clone()), RecordStore::new(repo))
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let (credentials, _) = stores();
        let a = credentials
            .create(CredentialFields::new("A", "u", "p"))
            .await
            .unwrap();
        let b = credentials
            .create(CredentialFields::new("A", "u", "p"))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(credentials.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let (credentials, _) = stores();
        let err = credentials
            .create(CredentialFields::new("", "u", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(credentials.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let (_, notes) = stores();
        let err = notes
            .update(Uuid::new_v4(), NoteFields::new("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let (_, notes) = stores();
        let note = notes.create(NoteFields::new("t", "b")).await.unwrap();
        let updated = notes
            .update(note.id, NoteFields::new("t2", "b2"))
            .await
            .unwrap();
        assert_eq!(updated.id, note.id);
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(notes.get(note.id).await.unwrap().title, "t2");
    }

    #[tokio::test]
    async fn test_create_many_rejects_batch_with_invalid_entry() {
        let (credentials, _) = stores();
        let err = credentials
            .create_many(vec![
                CredentialFields::new("ok", "u", "p"),
                CredentialFields::new("bad", "", "p"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(credentials.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_drafts_keeps_timestamps() {
        let (credentials, _) = stores();
        let created_at = "2023-04-01T12:00:00Z".parse().unwrap();
        let draft = Draft {
            fields: CredentialFields::new("old", "u", "p"),
            created_at: Some(created_at),
            updated_at: None,
        };
        let records = credentials.create_drafts(vec![draft]).await.unwrap();
        assert_eq!(records[0].created_at, created_at);
        assert_eq!(records[0].updated_at, created_at);
    }
}
