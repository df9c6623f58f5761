//! Scoring error taxonomy.
//!
//! Most variants are recovered locally by the serving path: no transaction
//! history and storage failures both degrade to a neutral score record, and
//! a missing or corrupt artifact bundle puts the whole service into fallback
//! mode. Only `SchemaMismatch` is fatal, since scoring through misaligned
//! features would silently corrupt every result.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the scoring pipeline and model lifecycle.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The wallet has no transaction history.
    #[error("no transactions found for wallet")]
    DataUnavailable,

    /// Transaction store query or connection failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A required artifact file is absent at its expected location.
    #[error("artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// The artifact bundle exists but could not be deserialized.
    #[error("artifact load failed: {0}")]
    ArtifactLoad(String),

    /// Metadata feature list disagrees with the feature builder schema.
    #[error("feature schema mismatch: metadata {found:?}, builder {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Artifact serialization failure during save or export.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid input to training or scoring.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;

impl ScoringError {
    /// Whether the serving path recovers from this error with a degraded
    /// score instead of propagating it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable
                | Self::Storage(_)
                | Self::ArtifactMissing(_)
                | Self::ArtifactLoad(_)
        )
    }
}

impl From<sqlx::Error> for ScoringError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
