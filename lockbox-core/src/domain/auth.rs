//! Authentication domain models
//!
//! The configured second factor, the visibility state it guards and the
//! failure reasons a challenge can produce.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::result::{Error, Result};

/// Secret store key holding the configured method
pub const AUTH_METHOD_KEY: &str = "authMethod";

/// Secret store key holding the PIN comparison value
pub const PIN_KEY: &str = "user_pin";

/// Accepted PIN lengths (numeric keypad entry, max 6 digits)
pub const PIN_MIN_LEN: usize = 4;
pub const PIN_MAX_LEN: usize = 6;

/// Second factor used to reveal sensitive fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    Pin,
    Biometric,
}

impl AuthMethod {
    /// Parse the value persisted under [`AUTH_METHOD_KEY`]
    ///
    /// "Fingerprint" is what onboarding historically wrote for biometric.
    /// Unknown values are treated as no method.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("PIN") | Some("pin") | Some("Pin") => Self::Pin,
            Some("Fingerprint") | Some("Biometric") | Some("biometric") => Self::Biometric,
            _ => Self::None,
        }
    }

    /// Value written under [`AUTH_METHOD_KEY`], `None` for no method
    pub fn as_stored(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Pin => Some("PIN"),
            Self::Biometric => Some("Fingerprint"),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Pin => write!(f, "pin"),
            Self::Biometric => write!(f, "biometric"),
        }
    }
}

/// Stored comparison value for a PIN
///
/// Values written by this crate are Argon2id PHC strings. Older installs
/// stored the PIN itself; those are still compared, in constant time.
#[derive(Clone, PartialEq, Eq)]
pub struct PinVerifier(String);

impl PinVerifier {
    /// Hash a new PIN for storage
    pub fn hash(pin: &str) -> Result<Self> {
        validate_pin(pin)?;
        let salt_bytes: [u8; 16] = rand::thread_rng().gen();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::storage(format!("Failed to encode PIN salt: {}", e)))?;
        let hash = Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|e| Error::storage(format!("Failed to hash PIN: {}", e)))?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap a value read back from the secret store
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_stored(&self) -> &str {
        &self.0
    }

    pub fn is_hashed(&self) -> bool {
        self.0.starts_with("$argon2")
    }

    /// Compare an entered PIN against the stored value
    pub fn verify(&self, entered: &str) -> bool {
        if self.is_hashed() {
            match PasswordHash::new(&self.0) {
                Ok(parsed) => Argon2::default()
                    .verify_password(entered.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            }
        } else {
            self.0.as_bytes().ct_eq(entered.as_bytes()).into()
        }
    }
}

impl fmt::Debug for PinVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinVerifier(***)")
    }
}

/// Check that a PIN is 4-6 ASCII digits
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() < PIN_MIN_LEN || pin.len() > PIN_MAX_LEN {
        return Err(Error::validation(format!(
            "PIN must be {} to {} digits",
            PIN_MIN_LEN, PIN_MAX_LEN
        )));
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::validation("PIN must contain digits only"));
    }
    Ok(())
}

/// Process-wide authentication configuration, read from the secret store
#[derive(Debug, Clone, Default)]
pub struct AuthConfiguration {
    pub method: AuthMethod,
    pub pin: Option<PinVerifier>,
}

impl AuthConfiguration {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Whether sensitive fields may be rendered in plaintext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hidden,
    Revealed,
}

impl Visibility {
    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed)
    }
}

/// One authentication attempt supplied by the UI
#[derive(Clone)]
pub enum Challenge {
    /// PIN typed by the user
    Pin(String),
    /// Run the device biometric prompt
    Biometric,
}

impl Challenge {
    pub fn method(&self) -> AuthMethod {
        match self {
            Self::Pin(_) => AuthMethod::Pin,
            Self::Biometric => AuthMethod::Biometric,
        }
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(_) => f.write_str("Challenge::Pin(***)"),
            Self::Biometric => f.write_str("Challenge::Biometric"),
        }
    }
}

/// Why a challenge did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    /// Entered PIN does not match the stored value
    IncorrectPin,
    /// No biometric hardware, or nothing enrolled
    BiometricUnavailable,
    /// Live scan rejected or prompt dismissed
    BiometricFailed,
    /// The challenge does not match the configured method
    MethodNotConfigured,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncorrectPin => "incorrect_pin",
            Self::BiometricUnavailable => "biometric_unavailable",
            Self::BiometricFailed => "biometric_failed",
            Self::MethodNotConfigured => "method_not_configured",
        }
    }

    /// User-facing message
    pub fn message(&self) -> &'static str {
        match self {
            Self::IncorrectPin => "The PIN you entered is incorrect.",
            Self::BiometricUnavailable => {
                "Fingerprint authentication is not available on this device."
            }
            Self::BiometricFailed => "Failed to authenticate using fingerprint.",
            Self::MethodNotConfigured => "No matching authentication method is configured.",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_stored() {
        assert_eq!(AuthMethod::from_stored(Some("PIN")), AuthMethod::Pin);
        assert_eq!(AuthMethod::from_stored(Some("Fingerprint")), AuthMethod::Biometric);
        assert_eq!(AuthMethod::from_stored(Some("something")), AuthMethod::None);
        assert_eq!(AuthMethod::from_stored(None), AuthMethod::None);
    }

    #[test]
    fn test_hashed_pin_verifies() {
        let verifier = PinVerifier::hash("1234").unwrap();
        assert!(verifier.is_hashed());
        assert!(verifier.verify("1234"));
        assert!(!verifier.verify("0000"));
        assert!(!verifier.as_stored().contains("1234"));
    }

    #[test]
    fn test_plain_pin_verifies() {
        let verifier = PinVerifier::from_stored("987654");
        assert!(!verifier.is_hashed());
        assert!(verifier.verify("987654"));
        assert!(!verifier.verify("98765"));
    }

    #[test]
    fn test_pin_validation() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123456").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("1234567").is_err());
        assert!(validate_pin("12a4").is_err());
    }

    #[test]
    fn test_debug_hides_pin() {
        let challenge = Challenge::Pin("4321".to_string());
        assert!(!format!("{:?}", challenge).contains("4321"));
        let verifier = PinVerifier::from_stored("4321");
        assert!(!format!("{:?}", verifier).contains("4321"));
    }

    #[test]
    fn test_failure_codes() {
        assert_eq!(AuthFailure::IncorrectPin.to_string(), "incorrect_pin");
        assert_eq!(AuthFailure::BiometricUnavailable.code(), "biometric_unavailable");
        assert_eq!(AuthFailure::BiometricFailed.code(), "biometric_failed");
    }
}
