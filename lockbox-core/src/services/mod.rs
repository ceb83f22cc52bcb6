//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod backup;
pub mod encryption;
pub mod gate;
pub mod logging;
pub mod migration;
pub mod store;
pub mod vault;

pub use backup::{BackupCodec, DecodedArtifact};
pub use encryption::EncryptionService;
pub use gate::{Authenticator, Session, VisibilityGate, DEFAULT_BIOMETRIC_PROMPT};
pub use logging::{EntryPoint, EventLog, LogEntry, LogEvent, LogStats};
pub use migration::{MigrationResult, MigrationService};
pub use store::RecordStore;
pub use vault::{ExportOptions, ExportReceipt, Vault};
