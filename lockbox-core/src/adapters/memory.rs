//! In-memory adapters
//!
//! Used by embedding hosts that bring their own persistence and by tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::result::{Error, Result};
use crate::ports::{
    ArtifactLocation, ArtifactTransport, BiometricOutcome, BiometricPrompt, SecretStore,
};

/// Secret store held in process memory
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with the given key/value pairs
    pub fn with_secrets<I, K, V>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: RwLock::new(
                secrets
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(self.secrets.read().await.get(key).cloned())
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        self.secrets
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_secret(&self, key: &str) -> Result<()> {
        self.secrets.write().await.remove(key);
        Ok(())
    }
}

/// Biometric prompt that replays queued outcomes
///
/// When the queue runs dry every further prompt resolves as dismissed.
pub struct ScriptedBiometric {
    available: bool,
    enrolled: bool,
    outcomes: Mutex<VecDeque<BiometricOutcome>>,
    prompts: AtomicUsize,
    last_message: Mutex<Option<String>>,
}

impl ScriptedBiometric {
    pub fn new(available: bool, enrolled: bool) -> Self {
        Self {
            available,
            enrolled,
            outcomes: Mutex::new(VecDeque::new()),
            prompts: AtomicUsize::new(0),
            last_message: Mutex::new(None),
        }
    }

    /// Hardware present and a fingerprint enrolled
    pub fn ready() -> Self {
        Self::new(true, true)
    }

    pub fn with_outcomes(self, outcomes: impl IntoIterator<Item = BiometricOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..self
        }
    }

    pub async fn push_outcome(&self, outcome: BiometricOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// How many times the prompt was shown
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub async fn last_message(&self) -> Option<String> {
        self.last_message.lock().await.clone()
    }
}

#[async_trait]
impl BiometricPrompt for ScriptedBiometric {
    async fn hardware_available(&self) -> bool {
        self.available
    }

    async fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    async fn prompt_authenticate(&self, message: &str) -> BiometricOutcome {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().await = Some(message.to_string());
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or(BiometricOutcome::Dismissed)
    }
}

/// Artifact transport keeping artifacts in memory, addressed by key
#[derive(Default)]
pub struct MemoryTransport {
    artifacts: RwLock<HashMap<String, Vec<u8>>>,
    counter: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under a caller-chosen key (e.g. to stage an import)
    pub async fn put(&self, key: impl Into<String>, bytes: Vec<u8>) -> ArtifactLocation {
        let key = key.into();
        self.artifacts.write().await.insert(key.clone(), bytes);
        ArtifactLocation::Key(key)
    }

    pub async fn count(&self) -> usize {
        self.artifacts.read().await.len()
    }
}

#[async_trait]
impl ArtifactTransport for MemoryTransport {
    async fn write_artifact(&self, bytes: Vec<u8>) -> Result<ArtifactLocation> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(self.put(format!("artifact-{}", n), bytes).await)
    }

    async fn read_artifact(&self, location: &ArtifactLocation) -> Result<Vec<u8>> {
        let key = match location {
            ArtifactLocation::Key(key) => key,
            ArtifactLocation::Path(path) => {
                return Err(Error::not_found(format!(
                    "artifact {} is not held by this transport",
                    path.display()
                )))
            }
        };
        self.artifacts
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("artifact {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_biometric_replays_then_dismisses() {
        let bio = ScriptedBiometric::ready().with_outcomes([BiometricOutcome::Failed]);
        assert_eq!(bio.prompt_authenticate("a").await, BiometricOutcome::Failed);
        assert_eq!(bio.prompt_authenticate("b").await, BiometricOutcome::Dismissed);
        assert_eq!(bio.prompt_count(), 2);
        assert_eq!(bio.last_message().await, Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_memory_transport_round_trip() {
        let transport = MemoryTransport::new();
        let loc = transport.write_artifact(b"abc".to_vec()).await.unwrap();
        assert_eq!(transport.read_artifact(&loc).await.unwrap(), b"abc");

        let missing = ArtifactLocation::Key("nope".into());
        assert!(matches!(
            transport.read_artifact(&missing).await,
            Err(Error::NotFound(_))
        ));
    }
}
