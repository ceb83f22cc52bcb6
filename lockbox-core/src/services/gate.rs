//! Visibility gate - authentication-guarded reveal of sensitive fields
//!
//! [`Authenticator`] evaluates one-shot challenges against the configured
//! method. [`VisibilityGate`] holds the `Hidden`/`Revealed` state and only
//! moves to `Revealed` after a successful challenge.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::auth::{AUTH_METHOD_KEY, PIN_KEY};
use crate::domain::result::{Error, Result};
use crate::domain::{AuthConfiguration, AuthFailure, AuthMethod, Challenge, PinVerifier, Visibility};
use crate::ports::{BiometricOutcome, BiometricPrompt, SecretStore};

/// Default message shown by the biometric prompt
pub const DEFAULT_BIOMETRIC_PROMPT: &str = "Authenticate to view passwords";

pub struct Authenticator {
    secrets: Arc<dyn SecretStore>,
    biometric: Arc<dyn BiometricPrompt>,
    prompt_message: String,
}

impl Authenticator {
    pub fn new(secrets: Arc<dyn SecretStore>, biometric: Arc<dyn BiometricPrompt>) -> Self {
        Self {
            secrets,
            biometric,
            prompt_message: DEFAULT_BIOMETRIC_PROMPT.to_string(),
        }
    }

    pub fn with_prompt_message(mut self, message: impl Into<String>) -> Self {
        self.prompt_message = message.into();
        self
    }

    /// Read the configured method and PIN value from the secret store
    pub async fn configuration(&self) -> Result<AuthConfiguration> {
        let method = AuthMethod::from_stored(self.secrets.get_secret(AUTH_METHOD_KEY).await?.as_deref());
        let pin = self
            .secrets
            .get_secret(PIN_KEY)
            .await?
            .map(PinVerifier::from_stored);
        Ok(AuthConfiguration { method, pin })
    }

    /// Evaluate a single challenge
    ///
    /// No retries and no lockout: every call is independent.
    pub async fn evaluate(&self, challenge: &Challenge) -> Result<()> {
        let config = self.configuration().await?;
        let outcome = self.check(&config, challenge).await;
        if let Err(failure) = outcome {
            tracing::warn!(method = %challenge.method(), code = failure.code(), "challenge failed");
            return Err(Error::Authentication(failure));
        }
        Ok(())
    }

    async fn check(
        &self,
        config: &AuthConfiguration,
        challenge: &Challenge,
    ) -> std::result::Result<(), AuthFailure> {
        if config.method != challenge.method() {
            return Err(AuthFailure::MethodNotConfigured);
        }
        match challenge {
            Challenge::Pin(entered) => {
                let matched = match &config.pin {
                    Some(verifier) => verify_off_thread(verifier.clone(), entered.clone()).await,
                    None => false,
                };
                if matched {
                    Ok(())
                } else {
                    Err(AuthFailure::IncorrectPin)
                }
            }
            Challenge::Biometric => {
                if !self.biometric_ready().await {
                    return Err(AuthFailure::BiometricUnavailable);
                }
                match self.biometric.prompt_authenticate(&self.prompt_message).await {
                    BiometricOutcome::Success => Ok(()),
                    BiometricOutcome::Failed | BiometricOutcome::Dismissed => {
                        Err(AuthFailure::BiometricFailed)
                    }
                }
            }
        }
    }

    async fn biometric_ready(&self) -> bool {
        self.biometric.hardware_available().await && self.biometric.is_enrolled().await
    }

    /// Configure PIN authentication, storing an Argon2id hash of the PIN
    pub async fn setup_pin(&self, pin: &str) -> Result<()> {
        let pin = pin.to_string();
        let verifier = tokio::task::spawn_blocking(move || PinVerifier::hash(&pin))
            .await
            .map_err(|e| Error::storage(format!("PIN hashing task failed: {}", e)))??;
        self.secrets.set_secret(PIN_KEY, verifier.as_stored()).await?;
        self.write_method(AuthMethod::Pin).await
    }

    /// Configure biometric authentication
    ///
    /// Fails with `biometric_unavailable` when the device has no usable
    /// sensor or nothing is enrolled.
    pub async fn setup_biometric(&self) -> Result<()> {
        if !self.biometric_ready().await {
            return Err(Error::Authentication(AuthFailure::BiometricUnavailable));
        }
        self.secrets.remove_secret(PIN_KEY).await?;
        self.write_method(AuthMethod::Biometric).await
    }

    /// Remove any configured method
    pub async fn clear_method(&self) -> Result<()> {
        self.secrets.remove_secret(PIN_KEY).await?;
        self.secrets.remove_secret(AUTH_METHOD_KEY).await
    }

    async fn write_method(&self, method: AuthMethod) -> Result<()> {
        match method.as_stored() {
            Some(value) => self.secrets.set_secret(AUTH_METHOD_KEY, value).await?,
            None => self.secrets.remove_secret(AUTH_METHOD_KEY).await?,
        }
        tracing::debug!(method = %method, "auth method configured");
        Ok(())
    }
}

/// Argon2 verification runs on the blocking pool; a failed task counts as a mismatch
async fn verify_off_thread(verifier: PinVerifier, entered: String) -> bool {
    tokio::task::spawn_blocking(move || verifier.verify(&entered))
        .await
        .unwrap_or(false)
}

#[derive(Debug, Default)]
pub struct VisibilityGate {
    state: RwLock<Visibility>,
}

impl VisibilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Visibility {
        *self.state.read().await
    }

    /// Run the challenge and open the gate on success
    ///
    /// On failure the state is left as it was.
    pub async fn reveal(&self, authenticator: &Authenticator, challenge: &Challenge) -> Result<Visibility> {
        authenticator.evaluate(challenge).await?;
        let mut state = self.state.write().await;
        *state = Visibility::Revealed;
        Ok(*state)
    }

    pub async fn hide(&self) -> Visibility {
        let mut state = self.state.write().await;
        *state = Visibility::Hidden;
        *state
    }
}

/// Cloneable handle over the vault's gate, owned by the UI layer
///
/// All clones observe and change the same state.
#[derive(Clone)]
pub struct Session {
    gate: Arc<VisibilityGate>,
    authenticator: Arc<Authenticator>,
}

impl Session {
    pub fn new(gate: Arc<VisibilityGate>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            gate,
            authenticator,
        }
    }

    pub async fn visibility(&self) -> Visibility {
        self.gate.current().await
    }

    pub async fn is_revealed(&self) -> bool {
        self.gate.current().await.is_revealed()
    }

    pub async fn request_reveal(&self, challenge: &Challenge) -> Result<Visibility> {
        self.gate.reveal(&self.authenticator, challenge).await
    }

    pub async fn hide(&self) -> Visibility {
        self.gate.hide().await
    }
}
