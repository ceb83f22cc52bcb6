//! Encryption service - passphrase sealing of backup artifacts
//!
//! AES-256-GCM with a key derived from the passphrase by Argon2id. The
//! ciphertext travels inside a JSON envelope that records the KDF
//! parameters, salt and nonce.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;

use crate::domain::result::{Error, Result};
use crate::domain::{Argon2Params, SealedArtifact, SEALED_FORMAT, SEALED_VERSION};

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 16;
const KEY_LEN: u32 = 32;

/// Upper bound on memory cost accepted from an envelope (1 GiB)
const MAX_MEMORY_COST: u32 = 1024 * 1024;
/// Upper bound on Argon2 passes accepted from an envelope
const MAX_TIME_COST: u32 = 16;
/// Upper bound on Argon2 lanes accepted from an envelope
const MAX_PARALLELISM: u32 = 64;

/// Seals and opens backup artifacts
#[derive(Debug, Clone, Default)]
pub struct EncryptionService {
    params: Argon2Params,
}

impl EncryptionService {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    /// Derive encryption key from passphrase using Argon2id
    fn derive_key(passphrase: &str, salt: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
        let argon2_params = argon2::Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(params.hash_len as usize),
        )
        .map_err(|e| Error::format(format!("Invalid key derivation parameters: {}", e)))?;

        let argon2 = argon2::Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2_params,
        );

        let mut key = vec![0u8; params.hash_len as usize];
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| Error::format(format!("Failed to derive key: {}", e)))?;

        Ok(key)
    }

    /// Encrypt plain artifact bytes, returning the serialized envelope
    pub fn seal(&self, plain: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        if passphrase.is_empty() {
            return Err(Error::validation("passphrase must not be empty"));
        }
        let mut params = self.params.clone();
        params.hash_len = KEY_LEN;
        if !within_cost_limits(&params) {
            return Err(Error::validation("key derivation cost exceeds what a backup can be opened with"));
        }

        let mut rng = rand::thread_rng();
        let salt: [u8; SALT_SIZE] = rng.gen();
        let nonce_bytes: [u8; NONCE_SIZE] = rng.gen();

        let key = Self::derive_key(passphrase, &salt, &params)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| Error::storage(format!("Failed to initialise cipher: {}", e)))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plain)
            .map_err(|e| Error::storage(format!("Failed to encrypt backup: {}", e)))?;

        let sealed = SealedArtifact::new(
            params,
            STANDARD.encode(salt),
            STANDARD.encode(nonce_bytes),
            STANDARD.encode(ciphertext),
        );
        serde_json::to_vec_pretty(&sealed)
            .map_err(|e| Error::storage(format!("Failed to serialize sealed backup: {}", e)))
    }

    /// Decrypt an envelope back to the plain artifact bytes
    ///
    /// A wrong passphrase and a tampered ciphertext are indistinguishable
    /// and both yield a format error.
    pub fn open(sealed: &SealedArtifact, passphrase: &str) -> Result<Vec<u8>> {
        if sealed.format != SEALED_FORMAT || sealed.version != SEALED_VERSION {
            return Err(Error::format(format!(
                "Unsupported sealed backup {} version {}",
                sealed.format, sealed.version
            )));
        }
        if sealed.argon2_params.hash_len != KEY_LEN {
            return Err(Error::format("Sealed backup must use a 32-byte key"));
        }
        if !within_cost_limits(&sealed.argon2_params) {
            return Err(Error::format("Sealed backup key derivation cost is too high"));
        }

        let salt = decode_field("salt", &sealed.salt)?;
        let nonce_bytes = decode_field("nonce", &sealed.nonce)?;
        let ciphertext = decode_field("ciphertext", &sealed.ciphertext)?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(Error::format("Sealed backup nonce has the wrong length"));
        }

        let key = Self::derive_key(passphrase, &salt, &sealed.argon2_params)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| Error::format(format!("Invalid key: {}", e)))?;
        cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| Error::format("Could not decrypt backup: wrong passphrase or corrupted data"))
    }

    /// Parse bytes as a sealed envelope, `None` if they are something else
    pub fn detect(bytes: &[u8]) -> Option<SealedArtifact> {
        serde_json::from_slice::<SealedArtifact>(bytes)
            .ok()
            .filter(|sealed| sealed.format == SEALED_FORMAT)
    }
}

fn within_cost_limits(params: &Argon2Params) -> bool {
    params.memory_cost <= MAX_MEMORY_COST
        && params.time_cost <= MAX_TIME_COST
        && params.parallelism <= MAX_PARALLELISM
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| Error::format(format!("Invalid {} in sealed backup: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> EncryptionService {
        EncryptionService::new(Argon2Params {
            time_cost: 1,
            memory_cost: 1024,
            parallelism: 1,
            hash_len: 32,
        })
    }

    #[test]
    fn test_seal_then_open() {
        let sealed_bytes = fast().seal(b"plain artifact", "correct horse").unwrap();
        let sealed = EncryptionService::detect(&sealed_bytes).unwrap();
        assert_eq!(sealed.kdf, "argon2id");

        let opened = EncryptionService::open(&sealed, "correct horse").unwrap();
        assert_eq!(opened, b"plain artifact");
    }

    #[test]
    fn test_wrong_passphrase_is_format_error() {
        let sealed_bytes = fast().seal(b"plain", "right").unwrap();
        let sealed = EncryptionService::detect(&sealed_bytes).unwrap();
        let err = EncryptionService::open(&sealed, "wrong").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let sealed_bytes = fast().seal(b"plain", "pw").unwrap();
        let mut sealed = EncryptionService::detect(&sealed_bytes).unwrap();
        let mut raw = STANDARD.decode(&sealed.ciphertext).unwrap();
        raw[0] ^= 0xff;
        sealed.ciphertext = STANDARD.encode(raw);
        assert!(matches!(
            EncryptionService::open(&sealed, "pw"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_excessive_kdf_cost_is_rejected_before_derivation() {
        let sealed_bytes = fast().seal(b"plain", "pw").unwrap();

        let mut slow = EncryptionService::detect(&sealed_bytes).unwrap();
        slow.argon2_params.time_cost = u32::MAX;
        let err = EncryptionService::open(&slow, "pw").unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        let mut wide = EncryptionService::detect(&sealed_bytes).unwrap();
        wide.argon2_params.parallelism = u32::MAX;
        assert!(matches!(EncryptionService::open(&wide, "pw"), Err(Error::Format(_))));

        let too_slow = EncryptionService::new(Argon2Params {
            time_cost: MAX_TIME_COST + 1,
            ..fast().params().clone()
        });
        assert!(matches!(too_slow.seal(b"x", "pw"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_detect_ignores_plain_json() {
        assert!(EncryptionService::detect(br#"{"format":"lockbox-backup"}"#).is_none());
        assert!(EncryptionService::detect(b"[]").is_none());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(fast().seal(b"x", ""), Err(Error::Validation(_))));
    }
}
