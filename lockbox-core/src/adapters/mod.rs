//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the RecordStorage port
//! - A JSON file for the SecretStore port
//! - The local filesystem for the ArtifactTransport port
//! - In-memory secrets, biometric prompt and transport for embedding and tests

pub mod biometric;
pub mod duckdb;
pub mod filesystem;
pub mod memory;
pub mod secrets;
