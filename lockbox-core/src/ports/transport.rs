//! Artifact transport port - hands backup bytes to and from the outside world

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Where an artifact was written or should be read from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArtifactLocation {
    Path(PathBuf),
    /// Opaque key understood by a non-file transport
    Key(String),
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<PathBuf> for ArtifactLocation {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    async fn write_artifact(&self, bytes: Vec<u8>) -> Result<ArtifactLocation>;

    async fn read_artifact(&self, location: &ArtifactLocation) -> Result<Vec<u8>>;
}
