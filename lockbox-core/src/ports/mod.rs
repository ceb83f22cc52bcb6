//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod biometric;
mod repository;
mod secrets;
mod transport;

pub use biometric::{BiometricOutcome, BiometricPrompt};
pub use repository::RecordStorage;
pub use secrets::SecretStore;
pub use transport::{ArtifactLocation, ArtifactTransport};
