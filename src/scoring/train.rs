//! Offline training pipeline.
//!
//! `train_model` is the stable contract: it takes a feature matrix and
//! returns a fitted forest plus the scaler frozen over that population.
//! The synthetic population generator is a stand-in until real aggregated
//! wallet statistics are wired in; it sits behind the same "produce a
//! training matrix" shape so swapping it requires no change to
//! `train_model`.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::core::Result;

use super::artifacts::{ArtifactBundle, ModelMetadata};
use super::features::FEATURE_COUNT;
use super::forest::{ForestConfig, IsolationForest};
use super::scaler::StandardScaler;

/// Typical wallet activity: [tx_count, avg_value, max_value, incoming, outgoing].
const NORMAL_MEAN: [f64; FEATURE_COUNT] = [50.0, 1000.0, 5000.0, 25.0, 25.0];
const NORMAL_STD: [f64; FEATURE_COUNT] = [20.0, 300.0, 2000.0, 10.0, 10.0];

/// Rare extreme behavior: very many, very large, strongly one-directional.
const ANOMALY_MEAN: [f64; FEATURE_COUNT] = [200.0, 5000.0, 25_000.0, 5.0, 200.0];
const ANOMALY_STD: [f64; FEATURE_COUNT] = [40.0, 2000.0, 12_000.0, 2.0, 50.0];

/// Anomalous cluster size relative to the normal cluster.
const ANOMALY_FRACTION: f64 = 0.05;

/// Training run configuration.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Normal-cluster sample count.
    pub n_samples: usize,
    /// Semantic version written into the bundle metadata.
    pub version: String,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_samples: 2000,
            version: "1.0".to_string(),
            forest: ForestConfig::default(),
        }
    }
}

/// Sample a two-cluster Gaussian population: `n` typical wallets plus a
/// ~5% anomalous cluster, concatenated and shuffled.
pub fn synthetic_population(n: usize, seed: u64) -> Vec<[f64; FEATURE_COUNT]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_anomalies = (n as f64 * ANOMALY_FRACTION) as usize;

    let mut data = Vec::with_capacity(n + n_anomalies);
    for _ in 0..n {
        data.push(gaussian_row(&mut rng, &NORMAL_MEAN, &NORMAL_STD));
    }
    for _ in 0..n_anomalies {
        data.push(gaussian_row(&mut rng, &ANOMALY_MEAN, &ANOMALY_STD));
    }
    data.shuffle(&mut rng);
    data
}

/// Fit scaler then forest over `matrix`. The matrix source is
/// interchangeable (synthetic today, real wallet aggregates later).
pub fn train_model(
    matrix: &[[f64; FEATURE_COUNT]],
    forest_config: ForestConfig,
) -> Result<(IsolationForest, StandardScaler)> {
    let scaler = StandardScaler::fit(matrix);
    let scaled = scaler.transform_matrix(matrix);
    let model = IsolationForest::fit(forest_config, &scaled)?;
    Ok((model, scaler))
}

/// Full offline run: generate the population, train, and write raw
/// (pre-export) artifacts into `work_dir`.
pub fn run_training(config: &TrainingConfig, work_dir: &Path) -> Result<ModelMetadata> {
    info!(samples = config.n_samples, "generating synthetic training data");
    let matrix = synthetic_population(config.n_samples, config.forest.seed);

    info!(
        n_estimators = config.forest.n_estimators,
        contamination = config.forest.contamination,
        "training isolation forest"
    );
    let (model, scaler) = train_model(&matrix, config.forest.clone())?;

    let meta = ModelMetadata::new(
        &config.version,
        config.forest.contamination,
        config.forest.n_estimators,
    );
    let bundle = ArtifactBundle {
        model,
        scaler,
        meta: meta.clone(),
    };
    bundle.save(work_dir)?;

    info!(dir = %work_dir.display(), "raw model artifacts saved");
    Ok(meta)
}

/// Standard normal via Box-Muller.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn gaussian_row(
    rng: &mut StdRng,
    mean: &[f64; FEATURE_COUNT],
    std: &[f64; FEATURE_COUNT],
) -> [f64; FEATURE_COUNT] {
    let mut row = [0.0; FEATURE_COUNT];
    for i in 0..FEATURE_COUNT {
        row[i] = mean[i] + std[i] * standard_normal(rng);
    }
    row
}
