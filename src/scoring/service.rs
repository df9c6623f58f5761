//! Serving entry point: one wallet query through the whole pipeline.
//!
//! The service context is built once at startup (transaction source plus
//! the optionally loaded artifact bundle) and shared read-only by every
//! request. Scoring never mutates it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{Result, ScoringError};

use super::artifacts::ArtifactBundle;
use super::features::{FeatureVector, TxRecord, FEATURE_COUNT};
use super::normalize::risk_score;

/// Query capability the core consumes; the relational store implements it,
/// tests substitute in-memory fakes.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// All records in which the canonicalized wallet appears as sender or
    /// receiver, most recent first.
    async fn transactions_for_wallet(&self, wallet: &str) -> Result<Vec<TxRecord>>;
}

/// The three ways a scoring request can resolve. Callers must handle all of
/// them; there is no nullable-model path.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// No transaction history, or the fetch itself failed.
    NoData,
    /// History exists but no model is loaded: fixed neutral score.
    Fallback { features: FeatureVector },
    /// Scored through the loaded bundle.
    ModelBased {
        features: FeatureVector,
        risk_score: u8,
        model_version: String,
    },
}

/// Public score record returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Canonical (lower-cased) wallet identifier.
    pub wallet: String,
    /// Always within [0, 100], on every path.
    pub risk_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<[f64; FEATURE_COUNT]>,
    pub model_based: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Neutral score returned when history exists but no model is loaded.
const FALLBACK_RISK_SCORE: u8 = 50;

/// Scoring service context: transaction source plus the bundle loaded once
/// at startup (absent when the service runs in fallback mode).
pub struct ScoringService {
    source: Arc<dyn TransactionSource>,
    bundle: Option<ArtifactBundle>,
}

impl ScoringService {
    pub fn new(source: Arc<dyn TransactionSource>, bundle: Option<ArtifactBundle>) -> Self {
        Self { source, bundle }
    }

    pub fn model_loaded(&self) -> bool {
        self.bundle.is_some()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.bundle.as_ref().map(|b| b.meta.version.as_str())
    }

    /// Canonicalize, fetch, extract, and score. Storage failure is treated
    /// the same as no data: the service degrades rather than failing the
    /// caller.
    pub async fn score_outcome(&self, wallet: &str) -> (String, ScoreOutcome) {
        let wallet = wallet.trim().to_lowercase();

        let records = match self.source.transactions_for_wallet(&wallet).await {
            Ok(records) => records,
            Err(err) => {
                warn!(wallet = %wallet, error = %err, "transaction fetch failed, degrading to no-data");
                return (wallet, ScoreOutcome::NoData);
            }
        };

        let features = match FeatureVector::extract(&wallet, &records) {
            Ok(features) => features,
            Err(ScoringError::DataUnavailable) => return (wallet, ScoreOutcome::NoData),
            Err(err) => {
                warn!(wallet = %wallet, error = %err, "feature extraction failed");
                return (wallet, ScoreOutcome::NoData);
            }
        };

        let Some(bundle) = &self.bundle else {
            return (wallet, ScoreOutcome::Fallback { features });
        };

        let scaled = bundle.scaler.transform(&features.to_array());
        let raw = bundle.model.decision_function(&scaled);
        let risk = risk_score(raw);
        debug!(wallet = %wallet, raw, risk, "model-based score computed");

        (
            wallet,
            ScoreOutcome::ModelBased {
                features,
                risk_score: risk,
                model_version: bundle.meta.version.clone(),
            },
        )
    }

    /// Score a wallet and shape the result for callers.
    pub async fn score(&self, wallet: &str) -> ScoreRecord {
        let (wallet, outcome) = self.score_outcome(wallet).await;
        match outcome {
            ScoreOutcome::NoData => ScoreRecord {
                wallet,
                risk_score: 0,
                features: None,
                model_based: false,
                model_version: None,
                message: Some("No transactions found".to_string()),
            },
            ScoreOutcome::Fallback { features } => ScoreRecord {
                wallet,
                risk_score: FALLBACK_RISK_SCORE,
                features: Some(features.to_array()),
                model_based: false,
                model_version: None,
                message: None,
            },
            ScoreOutcome::ModelBased {
                features,
                risk_score,
                model_version,
            } => ScoreRecord {
                wallet,
                risk_score,
                features: Some(features.to_array()),
                model_based: true,
                model_version: Some(model_version),
                message: None,
            },
        }
    }
}
