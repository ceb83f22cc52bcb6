//! Secret store port - key/value storage for authentication material

use async_trait::async_trait;

use crate::domain::result::Result;

/// Device secret storage (keychain, keystore, or a protected file)
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, key: &str) -> Result<Option<String>>;

    async fn set_secret(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove_secret(&self, key: &str) -> Result<()>;
}
