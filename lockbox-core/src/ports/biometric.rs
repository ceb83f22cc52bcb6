//! Biometric prompt port

use async_trait::async_trait;

/// Result of a biometric prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    /// The live scan did not match
    Failed,
    /// The user closed the prompt
    Dismissed,
}

/// Device biometric primitive
#[async_trait]
pub trait BiometricPrompt: Send + Sync {
    async fn hardware_available(&self) -> bool;

    async fn is_enrolled(&self) -> bool;

    /// Show the prompt and wait for the user
    async fn prompt_authenticate(&self, message: &str) -> BiometricOutcome;
}
