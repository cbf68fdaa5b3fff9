//! Artifact persistence tests
//!
//! The trainer writes the artifact and the service reads it; both sides
//! must agree byte-for-byte and reject tampered files.

use std::fs;

use serde_json::json;
use tempfile::tempdir;
use winerate_model::{
    hash_path, CalibratedModel, ForestParams, ModelError, ModelMetadata, Node, RandomForest,
    SigmoidCalibrator, Tree, FEATURE_COUNT,
};

fn two_tree_model() -> CalibratedModel {
    let trees = vec![
        Tree::new(vec![
            Node::internal(0, 7, 10.5, 1, 2),
            Node::leaf(1, 0.1),
            Node::leaf(2, 0.8),
        ]),
        Tree::new(vec![
            Node::internal(0, 0, 0.4, 1, 2),
            Node::leaf(1, 0.7),
            Node::internal(2, 6, 0.6, 3, 4),
            Node::leaf(3, 0.3),
            Node::leaf(4, 0.5),
        ]),
    ];
    CalibratedModel::new(
        RandomForest::new(trees, FEATURE_COUNT, ForestParams::default()),
        SigmoidCalibrator::new(-4.0, 2.0),
        ModelMetadata {
            created_at: 1_700_000_000,
            train_rows: 100,
            calibration_rows: 20,
            crate_version: winerate_model::VERSION.to_string(),
        },
    )
}

#[test]
fn test_save_then_load_is_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model_artifact").join("wine_rate_v1.bin");

    let model = two_tree_model();
    let digest = model.save(&path).unwrap();

    assert!(path.exists());
    assert_eq!(fs::read_to_string(hash_path(&path)).unwrap(), digest);

    let (loaded, loaded_digest) = CalibratedModel::load(&path).unwrap();
    assert_eq!(loaded, model);
    assert_eq!(loaded_digest, digest);
}

#[test]
fn test_tampered_artifact_fails_hash_check() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wine_rate_v1.bin");
    two_tree_model().save(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, bytes).unwrap();

    assert!(matches!(
        CalibratedModel::load(&path),
        Err(ModelError::HashMismatch { .. })
    ));
}

#[test]
fn test_missing_artifact_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        CalibratedModel::load(dir.path().join("absent.bin")),
        Err(ModelError::Io(_))
    ));
}

#[test]
fn test_loaded_model_scores_json_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wine_rate_v1.bin");
    let model = two_tree_model();
    model.save(&path).unwrap();
    let (loaded, _) = CalibratedModel::load(&path).unwrap();

    let record = json!({
        "volatile_acidity": 0.7,
        "citric_acid": 0.0,
        "free_sulfur_dioxide": 11.0,
        "total_sulfur_dioxide": 34.0,
        "density": 0.9978,
        "ph": 3.51,
        "sulphates": 0.56,
        "alcohol": 9.4
    });

    let probability = loaded.predict_record(&record).unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert_eq!(probability, model.predict_record(&record).unwrap());
}
