//! Service-wide configuration and error types.

pub mod config;
pub mod errors;

pub use config::{ArtifactConfig, ServerConfig, ServiceConfig, StorageConfig};
pub use errors::{Result, ScoringError};
