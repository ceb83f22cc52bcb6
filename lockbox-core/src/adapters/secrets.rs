//! File-backed secret store
//!
//! Keeps secrets in a flat JSON object (`secrets.json`). Writes go to a
//! temporary file in the same directory that is then renamed over the
//! original, so a crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::ports::SecretStore;

pub const SECRETS_FILE: &str = "secrets.json";

pub struct FileSecretStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(vault_dir: &Path) -> Self {
        Self {
            path: vault_dir.join(SECRETS_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_secrets(&path))
            .await
            .map_err(|e| Error::storage(format!("Secret store task failed: {}", e)))?
    }

    async fn store(&self, secrets: BTreeMap<String, String>) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_secrets(&path, &secrets))
            .await
            .map_err(|e| Error::storage(format!("Secret store task failed: {}", e)))?
    }
}

fn read_secrets(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::storage(format!("Secret store is corrupted: {}", e)))
}

fn write_secrets(path: &Path, secrets: &BTreeMap<String, String>) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::storage("Secret store path has no parent directory"))?;
    fs::create_dir_all(dir)?;

    let content = serde_json::to_vec_pretty(secrets)
        .map_err(|e| Error::storage(format!("Failed to serialize secrets: {}", e)))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o600))?;
    }
    temp.write_all(&content)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| Error::storage(format!("Failed to replace secret store: {}", e.error)))?;
    Ok(())
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut secrets = self.load().await?;
        secrets.insert(key.to_string(), value.to_string());
        self.store(secrets).await
    }

    async fn remove_secret(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut secrets = self.load().await?;
        if secrets.remove(key).is_some() {
            self.store(secrets).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        assert_eq!(store.get_secret("authMethod").await.unwrap(), None);
        store.set_secret("authMethod", "PIN").await.unwrap();
        store.set_secret("user_pin", "hash").await.unwrap();
        assert_eq!(
            store.get_secret("authMethod").await.unwrap(),
            Some("PIN".to_string())
        );

        store.remove_secret("authMethod").await.unwrap();
        store.remove_secret("authMethod").await.unwrap();
        assert_eq!(store.get_secret("authMethod").await.unwrap(), None);
        assert_eq!(store.get_secret("user_pin").await.unwrap(), Some("hash".to_string()));
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempdir().unwrap();
        FileSecretStore::new(dir.path())
            .set_secret("k", "v")
            .await
            .unwrap();
        let reopened = FileSecretStore::new(dir.path());
        assert_eq!(reopened.get_secret("k").await.unwrap(), Some("v".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());
        store.set_secret("k", "v").await.unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_storage_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SECRETS_FILE), "not json").unwrap();
        let store = FileSecretStore::new(dir.path());
        let err = store.get_secret("k").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
