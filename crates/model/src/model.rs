//! Calibrated wine classifier and its on-disk artifact
//!
//! The artifact is a bincode encoding of [`CalibratedModel`]. A BLAKE3
//! digest of the encoded bytes is written to a `.hash` sidecar next to
//! it and verified on load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::calibration::SigmoidCalibrator;
use crate::errors::{ModelError, Result};
use crate::features::{select_features, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::forest::RandomForest;

/// Artifact format version
pub const ARTIFACT_VERSION: i32 = 1;

/// Default artifact location, relative to the working directory
pub const DEFAULT_ARTIFACT_PATH: &str = "./model_artifact/wine_rate_v1.bin";

/// Provenance recorded alongside the fitted estimators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    /// Unix timestamp (seconds) of the training run
    pub created_at: i64,
    pub train_rows: usize,
    pub calibration_rows: usize,
    pub crate_version: String,
}

/// Forest wrapped in a sigmoid calibrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibratedModel {
    pub version: i32,
    /// Feature names in the order the forest consumes them
    pub feature_names: Vec<String>,
    pub forest: RandomForest,
    pub calibrator: SigmoidCalibrator,
    pub metadata: ModelMetadata,
}

impl CalibratedModel {
    pub fn new(forest: RandomForest, calibrator: SigmoidCalibrator, metadata: ModelMetadata) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            feature_names: FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect(),
            forest,
            calibrator,
            metadata,
        }
    }

    /// Validate model structure and schema
    pub fn validate(&self) -> Result<()> {
        if self.version != ARTIFACT_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported artifact version: {}",
                self.version
            )));
        }

        if self.feature_names != FEATURE_COLUMNS {
            return Err(ModelError::ValidationFailed(format!(
                "Feature schema mismatch: artifact has {:?}, expected {:?}",
                self.feature_names, FEATURE_COLUMNS
            )));
        }

        if self.forest.feature_count != FEATURE_COUNT {
            return Err(ModelError::ValidationFailed(format!(
                "Forest expects {} features, schema has {}",
                self.forest.feature_count, FEATURE_COUNT
            )));
        }

        self.forest.validate().map_err(ModelError::ValidationFailed)?;

        if !self.calibrator.is_finite() {
            return Err(ModelError::ValidationFailed(
                "Calibrator parameters are not finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Calibrated probability that the wine is good
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let raw = self.forest.predict_positive(features);
        self.calibrator.apply(raw)
    }

    /// Calibrated probabilities for many feature vectors
    pub fn predict_proba_batch(&self, rows: &[FeatureVector]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_proba(row)).collect()
    }

    /// Select the model features from a JSON record and score it
    pub fn predict_record(&self, record: &Value) -> Result<f64> {
        let features = select_features(record)?;
        debug!(?features, "selected wine record");
        Ok(self.predict_proba(&features))
    }

    /// Encode to the binary artifact format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and validate a binary artifact
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: CalibratedModel = bincode::deserialize(bytes)?;
        model.validate()?;
        Ok(model)
    }

    /// Write the artifact and its hash sidecar, returning the hex digest
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.to_bytes()?;
        let digest = artifact_digest(&bytes);
        fs::write(path, &bytes)?;
        fs::write(hash_path(path), &digest)?;
        Ok(digest)
    }

    /// Read an artifact, verify its sidecar digest when present, and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, String)> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let digest = artifact_digest(&bytes);

        let sidecar = hash_path(path);
        if sidecar.exists() {
            let expected = fs::read_to_string(&sidecar)?.trim().to_string();
            if expected != digest {
                return Err(ModelError::HashMismatch {
                    expected,
                    actual: digest,
                });
            }
        } else {
            warn!("No hash sidecar at {}; skipping integrity check", sidecar.display());
        }

        let model = Self::from_bytes(&bytes)?;
        Ok((model, digest))
    }
}

/// BLAKE3 hex digest of artifact bytes
pub fn artifact_digest(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Sidecar path holding the artifact digest
pub fn hash_path(path: &Path) -> PathBuf {
    path.with_extension("hash")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestParams;
    use crate::tree::{Node, Tree};

    fn alcohol_model() -> CalibratedModel {
        // Single stump on alcohol (feature 7).
        let tree = Tree::new(vec![
            Node::internal(0, 7, 10.5, 1, 2),
            Node::leaf(1, 0.2),
            Node::leaf(2, 0.9),
        ]);
        let forest = RandomForest::new(vec![tree], FEATURE_COUNT, ForestParams::default());
        CalibratedModel::new(
            forest,
            SigmoidCalibrator::new(-5.0, 2.5),
            ModelMetadata {
                created_at: 0,
                train_rows: 3,
                calibration_rows: 3,
                crate_version: "test".to_string(),
            },
        )
    }

    #[test]
    fn test_predict_proba_applies_calibration() {
        let model = alcohol_model();
        let mut features = [0.0; FEATURE_COUNT];
        features[7] = 9.4;
        let low = model.predict_proba(&features);
        features[7] = 12.8;
        let high = model.predict_proba(&features);

        assert!((low - model.calibrator.apply(0.2)).abs() < 1e-12);
        assert!((high - model.calibrator.apply(0.9)).abs() < 1e-12);
        assert!(low < 0.5 && high > 0.5);
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let mut model = alcohol_model();
        model.feature_names.swap(0, 1);
        assert!(matches!(model.validate(), Err(ModelError::ValidationFailed(_))));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let model = alcohol_model();
        let bytes = model.to_bytes().unwrap();
        let decoded = CalibratedModel::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(CalibratedModel::from_bytes(b"not a model").is_err());
    }

    #[test]
    fn test_hash_path() {
        assert_eq!(
            hash_path(Path::new("model_artifact/wine_rate_v1.bin")),
            PathBuf::from("model_artifact/wine_rate_v1.hash")
        );
    }
}
