//! End-to-end scoring pipeline and model lifecycle tests.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use wallet_risk::core::{Result, ScoringError};
use wallet_risk::scoring::{
    artifacts, train::run_training, train::TrainingConfig, ArtifactBundle, FeatureVector,
    ForestConfig, ScoringService, TransactionSource, TxRecord,
};

struct FixedSource {
    records: Vec<TxRecord>,
}

#[async_trait]
impl TransactionSource for FixedSource {
    async fn transactions_for_wallet(&self, _wallet: &str) -> Result<Vec<TxRecord>> {
        Ok(self.records.clone())
    }
}

fn tx(value: f64, from: &str, to: &str, block: i64) -> TxRecord {
    TxRecord {
        value,
        from_addr: from.to_string(),
        to_addr: to.to_string(),
        block_number: block,
    }
}

fn small_training_config() -> TrainingConfig {
    TrainingConfig {
        n_samples: 400,
        forest: ForestConfig {
            n_estimators: 50,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    }
}

#[test]
fn train_export_load_scores_identically() {
    let work = tempfile::tempdir().unwrap();
    let export = tempfile::tempdir().unwrap();

    run_training(&small_training_config(), work.path()).unwrap();
    artifacts::export(work.path(), export.path()).unwrap();

    let raw = ArtifactBundle::load(work.path()).unwrap();
    let promoted = ArtifactBundle::load(export.path()).unwrap();

    // The export step must not change scoring behavior, only metadata.
    let probe = [60.0, 1200.0, 6000.0, 30.0, 30.0];
    let raw_score = raw.model.decision_function(&raw.scaler.transform(&probe));
    let promoted_score = promoted
        .model
        .decision_function(&promoted.scaler.transform(&probe));
    assert_eq!(raw_score, promoted_score);

    assert!(!raw.meta.exported);
    assert!(promoted.meta.exported);
    assert_eq!(promoted.meta.version, "1.0");
}

#[test]
fn export_without_training_fails_typed() {
    let work = tempfile::tempdir().unwrap();
    let export = tempfile::tempdir().unwrap();

    let err = artifacts::export(work.path(), export.path()).unwrap_err();
    assert!(matches!(err, ScoringError::ArtifactMissing(_)));
}

#[tokio::test]
async fn model_based_score_stays_in_bounds_for_extreme_wallets() {
    let export = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    run_training(&small_training_config(), work.path()).unwrap();
    artifacts::export(work.path(), export.path()).unwrap();
    let bundle = ArtifactBundle::load(export.path()).unwrap();

    // A wallet far outside anything the model saw in training.
    let records: Vec<TxRecord> = (0..500)
        .map(|i| tx(1_000_000.0, "0xwhale", "0xsink", i))
        .collect();
    let service = ScoringService::new(Arc::new(FixedSource { records }), Some(bundle));

    let record = service.score("0xWHALE").await;
    assert!(record.model_based);
    assert!(record.risk_score <= 100);
    // Extreme behavior must land on the risky side of the scale.
    assert!(record.risk_score >= 50, "risk = {}", record.risk_score);
}

#[tokio::test]
async fn typical_wallet_scores_below_clamp() {
    let export = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    run_training(&small_training_config(), work.path()).unwrap();
    artifacts::export(work.path(), export.path()).unwrap();
    let bundle = ArtifactBundle::load(export.path()).unwrap();

    // Roughly the synthetic normal cluster: ~50 txs around value 1000.
    let records: Vec<TxRecord> = (0..50)
        .map(|i| {
            if i % 2 == 0 {
                tx(1000.0 + i as f64 * 10.0, "0xpeer", "0xw", i)
            } else {
                tx(1000.0 - i as f64 * 5.0, "0xw", "0xpeer", i)
            }
        })
        .collect();
    let service = ScoringService::new(Arc::new(FixedSource { records }), Some(bundle));

    let record = service.score("0xw").await;
    assert!(record.model_based);
    // A typical point has a positive decision value, so its risk sits
    // strictly below the clamp.
    assert!(record.risk_score < 100, "risk = {}", record.risk_score);
}

proptest! {
    #[test]
    fn feature_invariants_hold(
        entries in prop::collection::vec((0.0f64..10_000.0, any::<bool>()), 1..50)
    ) {
        let records: Vec<TxRecord> = entries
            .iter()
            .enumerate()
            .map(|(i, (value, incoming))| {
                if *incoming {
                    tx(*value, "0xpeer", "0xw", i as i64)
                } else {
                    tx(*value, "0xw", "0xpeer", i as i64)
                }
            })
            .collect();

        let features = FeatureVector::extract("0xw", &records).unwrap();

        prop_assert_eq!(
            features.incoming_count + features.outgoing_count,
            features.tx_count
        );
        prop_assert_eq!(features.tx_count as usize, records.len());

        let min = entries.iter().map(|(v, _)| *v).fold(f64::INFINITY, f64::min);
        let max = entries.iter().map(|(v, _)| *v).fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(features.avg_value >= min - 1e-9);
        prop_assert!(features.avg_value <= max + 1e-9);
        prop_assert_eq!(features.max_value, max);
    }
}
