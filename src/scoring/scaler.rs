//! Per-feature standard scaling.
//!
//! Parameters are fit once over the training population and frozen; the
//! serving path applies them verbatim. They are versioned together with the
//! forest inside one artifact bundle, never stored or loaded independently,
//! so training-time and inference-time normalization cannot drift apart.

use serde::{Deserialize, Serialize};

use super::features::FEATURE_COUNT;

/// Fitted affine normalization: `(x - mean) / std` per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    std: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Fit per-feature mean and population standard deviation.
    ///
    /// A zero-variance feature gets std 1.0 so that `transform` stays
    /// deterministic (identity on the variance term) instead of dividing
    /// by zero.
    pub fn fit(matrix: &[[f64; FEATURE_COUNT]]) -> Self {
        let n = matrix.len().max(1) as f64;

        let mut mean = [0.0; FEATURE_COUNT];
        for row in matrix {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std = [0.0; FEATURE_COUNT];
        for row in matrix {
            for i in 0..FEATURE_COUNT {
                let d = row[i] - mean[i];
                std[i] += d * d;
            }
        }
        for s in &mut std {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { mean, std }
    }

    /// Apply the frozen parameters. Never refits.
    pub fn transform(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (x[i] - self.mean[i]) / self.std[i];
        }
        out
    }

    pub fn transform_matrix(&self, matrix: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        matrix.iter().map(|row| self.transform(row)).collect()
    }
}
