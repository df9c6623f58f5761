//! Wallet risk scoring pipeline.
//!
//! Feature extraction over a wallet's transaction history, a frozen
//! standard scaler, a seeded isolation forest, and normalization of the
//! raw anomaly score into the public 0-100 risk scale. Artifacts produced
//! by training are promoted through an explicit export step before the
//! serving path will load them.

pub mod artifacts;
pub mod features;
pub mod forest;
pub mod normalize;
pub mod scaler;
pub mod service;
pub mod train;

pub use artifacts::{ArtifactBundle, ModelMetadata};
pub use features::{FeatureVector, TxRecord, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{ForestConfig, IsolationForest};
pub use normalize::risk_score;
pub use scaler::StandardScaler;
pub use service::{ScoreOutcome, ScoreRecord, ScoringService, TransactionSource};
pub use train::{train_model, TrainingConfig};
