//! Seeded isolation forest.
//!
//! An ensemble of randomized partition trees built over sub-samples of the
//! scaled training population. Anomalous points sit closer to the root on
//! average, so their expected path length is short. Scores follow the
//! sklearn convention the rest of the pipeline assumes: `score_samples` is
//! in [-1, 0) with lower meaning more anomalous, and `decision_function`
//! subtracts an offset calibrated from the training contamination fraction,
//! so negative values indicate anomalies and positive values typical points.
//!
//! Fitting is fully determined by the seed in the config: two fits over
//! identical data and seed produce identical trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::{Result, ScoringError};

use super::features::FEATURE_COUNT;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Forest training configuration. The seed is part of training config, not
/// the model's runtime contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Per-tree sub-sample size, capped at the population size at fit time.
    pub max_samples: usize,
    /// Expected anomaly fraction; calibrates the decision offset only.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_samples: 256,
            contamination: 0.05,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted isolation forest. Immutable after `fit`; safe to share across
/// concurrent scoring requests without locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<Node>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    /// Build `n_estimators` trees over random sub-samples of `data` and
    /// calibrate the decision offset at the contamination quantile of the
    /// training scores.
    pub fn fit(config: ForestConfig, data: &[[f64; FEATURE_COUNT]]) -> Result<Self> {
        if data.len() < 2 {
            return Err(ScoringError::InvalidInput(format!(
                "isolation forest needs at least 2 training rows, got {}",
                data.len()
            )));
        }

        let sample_size = config.max_samples.clamp(2, data.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut trees = Vec::with_capacity(config.n_estimators);
        for _ in 0..config.n_estimators {
            let sample = rand::seq::index::sample(&mut rng, data.len(), sample_size).into_vec();
            trees.push(build_tree(&mut rng, data, sample, 0, height_limit));
        }

        let mut forest = Self {
            config,
            trees,
            sample_size,
            offset: 0.0,
        };

        // Offset at the contamination quantile: the configured fraction of
        // training points ends up with a negative decision value.
        let mut scores: Vec<f64> = data.iter().map(|x| forest.score_samples(x)).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let k = ((forest.config.contamination * scores.len() as f64).floor() as usize)
            .min(scores.len() - 1);
        forest.offset = scores[k];

        Ok(forest)
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Raw sample score in [-1, 0): `-(2 ^ (-E[h(x)] / c(psi)))`.
    /// Lower = more anomalous.
    pub fn score_samples(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let avg_path: f64 = self
            .trees
            .iter()
            .map(|tree| path_length(tree, x, 0))
            .sum::<f64>()
            / self.trees.len() as f64;

        -(2.0_f64.powf(-avg_path / average_path_length(self.sample_size)))
    }

    /// Offset-adjusted score: negative = anomalous, positive = typical.
    pub fn decision_function(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.score_samples(x) - self.offset
    }
}

fn build_tree(
    rng: &mut StdRng,
    data: &[[f64; FEATURE_COUNT]],
    indices: Vec<usize>,
    depth: usize,
    height_limit: usize,
) -> Node {
    let size = indices.len();
    if depth >= height_limit || size <= 1 {
        return Node::Leaf { size };
    }

    let feature = rng.gen_range(0..FEATURE_COUNT);
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &i in &indices {
        lo = lo.min(data[i][feature]);
        hi = hi.max(data[i][feature]);
    }
    if !(lo < hi) {
        return Node::Leaf { size };
    }

    let threshold = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| data[i][feature] < threshold);
    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size };
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(rng, data, left, depth + 1, height_limit)),
        right: Box::new(build_tree(rng, data, right, depth + 1, height_limit)),
    }
}

fn path_length(node: &Node, x: &[f64; FEATURE_COUNT], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if x[*feature] < *threshold {
                path_length(left, x, depth + 1)
            } else {
                path_length(right, x, depth + 1)
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points,
/// the standard isolation-forest normalizer.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
