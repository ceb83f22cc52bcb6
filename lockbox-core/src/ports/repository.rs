//! Repository port - durable record storage abstraction

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::Record;

/// Durable storage for one record kind
///
/// Every method commits before returning. Implementations return records
/// from `list` in insertion order, and `update` never changes that order.
#[async_trait]
pub trait RecordStorage<R: Record>: Send + Sync {
    /// Insert records in a single transaction (all or nothing)
    async fn insert(&self, records: Vec<R>) -> Result<()>;

    /// Overwrite the stored record with the same id
    ///
    /// Returns `false` when no such record exists.
    async fn update(&self, record: R) -> Result<bool>;

    /// Remove a record permanently. Returns `false` when it was absent.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn get(&self, id: Uuid) -> Result<Option<R>>;

    /// All records of this kind in insertion order
    async fn list(&self) -> Result<Vec<R>>;
}
