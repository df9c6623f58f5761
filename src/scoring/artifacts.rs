//! Versioned on-disk artifact bundle: model + scaler + metadata.
//!
//! Training writes raw artifacts to a working directory; an explicit export
//! step validates and promotes them into the self-contained directory the
//! server loads. Training never directly touches what serving loads.
//!
//! The bundle is immutable after export and loaded exactly once per service
//! lifetime; deploying a new model requires a restart.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{Result, ScoringError};

use super::features::FEATURE_NAMES;
use super::forest::IsolationForest;
use super::scaler::StandardScaler;

pub const MODEL_FILE: &str = "model.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const META_FILE: &str = "meta.json";

/// Bundle metadata. `version` is surfaced verbatim in score records;
/// `features` pins the schema the model was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model: String,
    pub version: String,
    pub features: Vec<String>,
    pub contamination: f64,
    pub n_estimators: usize,
    /// Set true only by the export step.
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl ModelMetadata {
    pub fn new(version: &str, contamination: f64, n_estimators: usize) -> Self {
        Self {
            model: "IsolationForest".to_string(),
            version: version.to_string(),
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            contamination,
            n_estimators,
            exported: false,
            exported_at: None,
        }
    }
}

/// The {model, scaler, metadata} unit produced by training and consumed by
/// serving. Read-only after load.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: IsolationForest,
    pub scaler: StandardScaler,
    pub meta: ModelMetadata,
}

impl ArtifactBundle {
    /// Write the bundle's three files into `dir` (pre-export working area
    /// or export directory, depending on the caller).
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let model_bytes = bincode::serialize(&self.model)
            .map_err(|e| ScoringError::Serialization(e.to_string()))?;
        let scaler_bytes = bincode::serialize(&self.scaler)
            .map_err(|e| ScoringError::Serialization(e.to_string()))?;
        let meta_bytes = serde_json::to_vec_pretty(&self.meta)
            .map_err(|e| ScoringError::Serialization(e.to_string()))?;

        fs::write(dir.join(MODEL_FILE), model_bytes)?;
        fs::write(dir.join(SCALER_FILE), scaler_bytes)?;
        fs::write(dir.join(META_FILE), meta_bytes)?;
        Ok(())
    }

    /// Deserialize a bundle from `dir`, failing typed on a missing file,
    /// corrupt serialization, or malformed metadata.
    ///
    /// The metadata feature list must equal the builder schema; a mismatch
    /// is fatal here rather than silently mis-aligning every score.
    pub fn load(dir: &Path) -> Result<Self> {
        let model_bytes = read_artifact(&dir.join(MODEL_FILE))?;
        let scaler_bytes = read_artifact(&dir.join(SCALER_FILE))?;
        let meta_bytes = read_artifact(&dir.join(META_FILE))?;

        let model: IsolationForest = bincode::deserialize(&model_bytes)
            .map_err(|e| ScoringError::ArtifactLoad(format!("{}: {}", MODEL_FILE, e)))?;
        let scaler: StandardScaler = bincode::deserialize(&scaler_bytes)
            .map_err(|e| ScoringError::ArtifactLoad(format!("{}: {}", SCALER_FILE, e)))?;
        let meta: ModelMetadata = serde_json::from_slice(&meta_bytes)
            .map_err(|e| ScoringError::ArtifactLoad(format!("{}: {}", META_FILE, e)))?;

        let expected: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        if meta.features != expected {
            return Err(ScoringError::SchemaMismatch {
                expected,
                found: meta.features,
            });
        }

        Ok(Self {
            model,
            scaler,
            meta,
        })
    }
}

/// Promote raw trained artifacts from `work_dir` into a self-contained
/// export directory, marking the metadata as exported.
///
/// Validates that all three source files exist before bundling, and loads
/// them through the same deserialization path the server uses so a corrupt
/// artifact fails at export time instead of at service start.
pub fn export(work_dir: &Path, export_dir: &Path) -> Result<ModelMetadata> {
    for file in [MODEL_FILE, SCALER_FILE, META_FILE] {
        let path = work_dir.join(file);
        if !path.exists() {
            return Err(ScoringError::ArtifactMissing(path));
        }
    }

    let mut bundle = ArtifactBundle::load(work_dir)?;
    bundle.meta.exported = true;
    bundle.meta.exported_at = Some(Utc::now());
    bundle.save(export_dir)?;

    info!(
        version = %bundle.meta.version,
        dir = %export_dir.display(),
        "model bundle exported"
    );
    Ok(bundle.meta)
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(ScoringError::ArtifactMissing(PathBuf::from(path)));
    }
    Ok(fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::forest::ForestConfig;

    fn trained_bundle() -> ArtifactBundle {
        let matrix: Vec<[f64; 5]> = (0..200)
            .map(|i| {
                let v = i as f64;
                [v, v * 2.0, v * 3.0, v / 2.0, v / 2.0]
            })
            .collect();
        let scaler = StandardScaler::fit(&matrix);
        let scaled = scaler.transform_matrix(&matrix);
        let model = IsolationForest::fit(
            ForestConfig {
                n_estimators: 20,
                max_samples: 64,
                ..ForestConfig::default()
            },
            &scaled,
        )
        .unwrap();
        ArtifactBundle {
            model,
            scaler,
            meta: ModelMetadata::new("1.0", 0.05, 20),
        }
    }

    #[test]
    fn test_save_load_roundtrip_scores_identically() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = trained_bundle();
        bundle.save(dir.path()).unwrap();

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        let probe = bundle.scaler.transform(&[50.0, 100.0, 150.0, 25.0, 25.0]);
        assert_eq!(
            bundle.model.decision_function(&probe),
            loaded.model.decision_function(&probe)
        );
        assert_eq!(bundle.meta, loaded.meta);
    }

    #[test]
    fn test_load_missing_directory() {
        let err = ArtifactBundle::load(Path::new("/nonexistent/bundle")).unwrap_err();
        assert!(matches!(err, ScoringError::ArtifactMissing(_)));
    }

    #[test]
    fn test_load_corrupt_model_file() {
        let dir = tempfile::tempdir().unwrap();
        trained_bundle().save(dir.path()).unwrap();
        fs::write(dir.path().join(MODEL_FILE), b"not bincode").unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ScoringError::ArtifactLoad(_)));
    }

    #[test]
    fn test_load_rejects_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut bundle = trained_bundle();
        // Same names, different order: still a violation.
        bundle.meta.features.swap(0, 1);
        bundle.save(dir.path()).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ScoringError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_export_requires_all_source_files() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        trained_bundle().save(work.path()).unwrap();
        fs::remove_file(work.path().join(SCALER_FILE)).unwrap();

        let err = export(work.path(), out.path()).unwrap_err();
        match err {
            ScoringError::ArtifactMissing(path) => {
                assert!(path.ends_with(SCALER_FILE));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_export_sets_flag_and_timestamp() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let bundle = trained_bundle();
        bundle.save(work.path()).unwrap();
        assert!(!bundle.meta.exported);

        let meta = export(work.path(), out.path()).unwrap();
        assert!(meta.exported);
        assert!(meta.exported_at.is_some());

        // The raw working area stays unexported: two-phase gate.
        let raw = ArtifactBundle::load(work.path()).unwrap();
        assert!(!raw.meta.exported);

        let promoted = ArtifactBundle::load(out.path()).unwrap();
        assert!(promoted.meta.exported);
    }
}
