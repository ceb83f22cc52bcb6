//! Biometric adapter for hosts without a fingerprint sensor

use async_trait::async_trait;

use crate::ports::{BiometricOutcome, BiometricPrompt};

/// Reports no hardware; terminal hosts use this
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBiometricHardware;

#[async_trait]
impl BiometricPrompt for NoBiometricHardware {
    async fn hardware_available(&self) -> bool {
        false
    }

    async fn is_enrolled(&self) -> bool {
        false
    }

    async fn prompt_authenticate(&self, _message: &str) -> BiometricOutcome {
        BiometricOutcome::Failed
    }
}
