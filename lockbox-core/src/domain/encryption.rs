//! Encryption domain models

use serde::{Deserialize, Serialize};

/// Default Argon2id parameters
pub const DEFAULT_TIME_COST: u32 = 3;
pub const DEFAULT_MEMORY_COST: u32 = 65536; // 64 MiB
pub const DEFAULT_PARALLELISM: u32 = 4;
pub const DEFAULT_HASH_LEN: u32 = 32;

/// Envelope tag for passphrase-sealed backups
pub const SEALED_FORMAT: &str = "lockbox-sealed-backup";
pub const SEALED_VERSION: u32 = 1;
pub const SEALED_ALGORITHM: &str = "aes-256-gcm";

/// Argon2id parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    pub time_cost: u32,
    pub memory_cost: u32,
    pub parallelism: u32,
    pub hash_len: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
            hash_len: DEFAULT_HASH_LEN,
        }
    }
}

/// A backup artifact encrypted with a passphrase
///
/// `ciphertext` is the AES-256-GCM encryption of the plain artifact bytes
/// (tag appended). All binary fields are standard base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedArtifact {
    pub format: String,
    pub version: u32,
    pub algorithm: String,
    pub kdf: String,
    pub argon2_params: Argon2Params,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

impl SealedArtifact {
    pub fn new(argon2_params: Argon2Params, salt: String, nonce: String, ciphertext: String) -> Self {
        Self {
            format: SEALED_FORMAT.to_string(),
            version: SEALED_VERSION,
            algorithm: SEALED_ALGORITHM.to_string(),
            kdf: "argon2id".to_string(),
            argon2_params,
            salt,
            nonce,
            ciphertext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_artifact_creation() {
        let sealed = SealedArtifact::new(
            Argon2Params::default(),
            "c2FsdA==".to_string(),
            "bm9uY2U=".to_string(),
            "Y2lwaGVy".to_string(),
        );
        assert_eq!(sealed.format, SEALED_FORMAT);
        assert_eq!(sealed.version, 1);
        assert_eq!(sealed.kdf, "argon2id");
        assert_eq!(sealed.argon2_params.memory_cost, 65536);
    }
}
