//! Filesystem artifact transport - backup file management
//!
//! Writes timestamped artifacts into `<vault>/backups`, lists them newest
//! first and optionally prunes old ones.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::BackupMetadata;
use crate::ports::{ArtifactLocation, ArtifactTransport};

const BACKUP_PREFIX: &str = "lockbox-";
const BACKUP_EXTENSION: &str = "json";

/// Artifact transport over a local backups directory
#[derive(Debug, Clone)]
pub struct FileArtifactTransport {
    backups_dir: PathBuf,
    max_backups: Option<usize>,
}

impl FileArtifactTransport {
    pub fn new(vault_dir: &Path, max_backups: Option<usize>) -> Self {
        Self {
            backups_dir: vault_dir.join("backups"),
            max_backups,
        }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Write an artifact under a fresh timestamped name
    pub fn create(&self, bytes: &[u8]) -> Result<BackupMetadata> {
        fs::create_dir_all(&self.backups_dir)?;

        let now = Utc::now();
        let timestamp = now.format("%Y-%m-%dT%H-%M-%S");
        let micros = now.timestamp_subsec_micros();
        let backup_name = format!(
            "{}{}-{:06}.{}",
            BACKUP_PREFIX, timestamp, micros, BACKUP_EXTENSION
        );
        let backup_path = self.backups_dir.join(&backup_name);

        // Backups may hold plaintext secrets, so they are never group or world readable
        let mut temp = tempfile::NamedTempFile::new_in(&self.backups_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o600))?;
        }
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&backup_path)
            .map_err(|e| Error::storage(format!("Failed to write backup: {}", e.error)))?;
        let size_bytes = fs::metadata(&backup_path)?.len();

        if let Some(max) = self.max_backups {
            self.apply_retention(max)?;
        }

        Ok(BackupMetadata::new(backup_name, now, size_bytes))
    }

    /// List all backups, newest first
    pub fn list(&self) -> Result<Vec<BackupMetadata>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }

            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) if name.starts_with(BACKUP_PREFIX) => name.to_string(),
                _ => continue,
            };

            let size_bytes = fs::metadata(&path)?.len();
            let created_at = parse_backup_time(&name);
            backups.push(BackupMetadata::new(name, created_at, size_bytes));
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Resolve a backup name to its path
    pub fn path_of(&self, backup_name: &str) -> PathBuf {
        self.backups_dir.join(backup_name)
    }

    /// Delete every backup
    pub fn clear(&self) -> Result<ClearResult> {
        let backups = self.list()?;
        for backup in &backups {
            fs::remove_file(self.path_of(&backup.name))?;
        }
        Ok(ClearResult {
            deleted: backups.len(),
        })
    }

    fn apply_retention(&self, max_backups: usize) -> Result<()> {
        let mut backups = self.list()?;
        while backups.len() > max_backups {
            if let Some(oldest) = backups.pop() {
                tracing::debug!(backup = %oldest.name, "pruning old backup");
                fs::remove_file(self.path_of(&oldest.name))?;
            }
        }
        Ok(())
    }
}

/// Parse creation time from a backup filename
fn parse_backup_time(backup_name: &str) -> DateTime<Utc> {
    backup_name
        .strip_prefix(BACKUP_PREFIX)
        .and_then(|s| s.strip_suffix(".json"))
        .and_then(|ts| {
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H-%M-%S-%f")
                .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H-%M-%S"))
                .ok()
        })
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::not_found(format!("backup {}", path.display())),
        _ => Error::from(e),
    })
}

#[async_trait]
impl ArtifactTransport for FileArtifactTransport {
    async fn write_artifact(&self, bytes: Vec<u8>) -> Result<ArtifactLocation> {
        let transport = self.clone();
        let metadata = tokio::task::spawn_blocking(move || transport.create(&bytes))
            .await
            .map_err(|e| Error::storage(format!("Backup task failed: {}", e)))??;
        Ok(ArtifactLocation::Path(self.path_of(&metadata.name)))
    }

    async fn read_artifact(&self, location: &ArtifactLocation) -> Result<Vec<u8>> {
        let path = match location {
            ArtifactLocation::Path(path) => path.clone(),
            // A bare name refers to a file in the backups directory
            ArtifactLocation::Key(name) => self.path_of(name),
        };
        tokio::task::spawn_blocking(move || read_file(&path))
            .await
            .map_err(|e| Error::storage(format!("Backup task failed: {}", e)))?
    }
}

#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub deleted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_backup_time() {
        let parsed = parse_backup_time("lockbox-2025-01-15T10-30-00-123456.json");
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-15 10:30:00");
    }

    #[test]
    fn test_create_and_list() {
        let dir = tempdir().unwrap();
        let transport = FileArtifactTransport::new(dir.path(), None);

        let meta = transport.create(b"{}").unwrap();
        assert!(meta.name.starts_with("lockbox-"));
        assert_eq!(meta.size_bytes, 2);

        // Unrelated files in the directory are ignored
        fs::write(transport.backups_dir().join("notes.txt"), "x").unwrap();

        let listed = transport.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, meta.name);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(transport.path_of(&meta.name))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o077, 0, "backup must not be readable by group or other");
        }
    }

    #[test]
    fn test_retention_keeps_newest() {
        let dir = tempdir().unwrap();
        let transport = FileArtifactTransport::new(dir.path(), Some(2));
        for _ in 0..4 {
            transport.create(b"{}").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(transport.list().unwrap().len(), 2);
        assert_eq!(transport.clear().unwrap().deleted, 2);
        assert!(transport.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_by_name_and_missing() {
        let dir = tempdir().unwrap();
        let transport = FileArtifactTransport::new(dir.path(), None);
        let location = transport.write_artifact(b"data".to_vec()).await.unwrap();
        assert_eq!(transport.read_artifact(&location).await.unwrap(), b"data");

        let name = transport.list().unwrap()[0].name.clone();
        let by_name = ArtifactLocation::Key(name);
        assert_eq!(transport.read_artifact(&by_name).await.unwrap(), b"data");

        let missing = ArtifactLocation::Path(dir.path().join("missing.json"));
        assert!(matches!(
            transport.read_artifact(&missing).await,
            Err(Error::NotFound(_))
        ));
    }
}
