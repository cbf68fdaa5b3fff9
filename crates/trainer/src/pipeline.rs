//! End-to-end training pipeline
//!
//! load → merge → deduplicate → split → fit forest → calibrate →
//! threshold sweep → evaluate → serialize.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use winerate_model::{canonical_json_string, CalibratedModel, ModelMetadata, FEATURE_COLUMNS};

use crate::calibration::PlattFitter;
use crate::config::TrainerConfig;
use crate::dataset::Dataset;
use crate::errors::Result;
use crate::forest::ForestTrainer;
use crate::metrics::{brier_score, f1_score, roc_auc, threshold_sweep, ThresholdSearch};
use crate::split::stratified_split;

/// Decision threshold the prediction service applies
pub const SERVING_THRESHOLD: f64 = 0.5;

/// Training report path for an artifact path
pub fn report_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("report.json")
}

/// Row counts at each stage of the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub loaded: usize,
    pub deduplicated: usize,
    pub train: usize,
    pub calibration: usize,
    pub threshold: usize,
    pub test: usize,
}

/// Held-out test metrics of the calibrated model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub roc_auc: f64,
    /// F1 at the serving threshold
    pub f1: f64,
    pub brier: f64,
}

/// Summary written next to the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub crate_version: String,
    pub created_at: i64,
    pub seed: u64,
    pub rows: RowCounts,
    /// F1-optimal threshold on the threshold split; not used for serving
    pub best_threshold: ThresholdSearch,
    pub serving_threshold: f64,
    pub test: TestMetrics,
    pub calibrator_a: f64,
    pub calibrator_b: f64,
    pub feature_importances: BTreeMap<String, f64>,
    pub artifact_hash: Option<String>,
}

/// Fitted model together with its report
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: CalibratedModel,
    pub report: TrainingReport,
}

/// Training pipeline driven by a [`TrainerConfig`]
pub struct TrainingPipeline {
    config: TrainerConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Load both source files, then merge and deduplicate them.
    ///
    /// Returns the cleaned dataset and the row count before deduplication.
    pub fn load_dataset(&self) -> Result<(Dataset, usize)> {
        info!("Loading red wine data from: {}", self.config.red_path.display());
        let red = Dataset::from_csv(&self.config.red_path)?;
        info!("Loading white wine data from: {}", self.config.white_path.display());
        let white = Dataset::from_csv(&self.config.white_path)?;
        info!("Loaded {} red and {} white samples", red.len(), white.len());

        let mut dataset = red.concat(white);
        let loaded = dataset.len();
        info!("Rows before deduplication: {loaded}");
        let removed = dataset.drop_duplicates();
        info!(
            "Rows after deduplication: {} ({} duplicates removed)",
            dataset.len(),
            removed
        );

        info!("Feature statistics:");
        for (name, min, max) in dataset.feature_stats() {
            info!("  {name}: min={min}, max={max}");
        }

        Ok((dataset, loaded))
    }

    /// Fit and evaluate on an already cleaned dataset
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        let seed = self.config.seed;
        let (fit_set, test_set) = partition(dataset, self.config.test_fraction, seed)?;
        let (train_set, validation_set) =
            partition(&fit_set, self.config.validation_fraction, seed)?;
        let (calibration_set, threshold_set) =
            partition(&validation_set, self.config.threshold_fraction, seed)?;

        info!(
            "Split sizes: train={}, calibration={}, threshold={}, test={}",
            train_set.len(),
            calibration_set.len(),
            threshold_set.len(),
            test_set.len()
        );

        let params = self.config.forest_params();
        info!("Training configuration:");
        info!("  Trees: {}", params.n_estimators);
        info!("  Max depth: {:?}", params.max_depth);
        info!("  Min samples to split: {}", params.min_samples_split);
        info!("  Min samples per leaf: {}", params.min_samples_leaf);
        info!("  Features per split: {}", params.max_features);
        info!("  Seed: {}", params.seed);

        let fitted = ForestTrainer::new(params)
            .fit(&train_set.features(), &train_set.labels())?;
        info!("Forest fitted with {} trees", fitted.forest.num_trees());
        for (name, importance) in FEATURE_COLUMNS.iter().zip(fitted.feature_importances) {
            debug!("  importance {name}: {importance:.4}");
        }

        let calibration_scores: Vec<f64> = calibration_set
            .features()
            .iter()
            .map(|row| fitted.forest.predict_positive(row))
            .collect();
        let calibrator = PlattFitter::default().fit(&calibration_scores, &calibration_set.labels())?;
        info!("Sigmoid calibration: a={:.6}, b={:.6}", calibrator.a, calibrator.b);

        let created_at = Utc::now().timestamp();
        let model = CalibratedModel::new(
            fitted.forest,
            calibrator,
            ModelMetadata {
                created_at,
                train_rows: train_set.len(),
                calibration_rows: calibration_set.len(),
                crate_version: crate::VERSION.to_string(),
            },
        );

        let threshold_probs = model.predict_proba_batch(&threshold_set.features());
        let best_threshold = threshold_sweep(
            &threshold_probs,
            &threshold_set.labels(),
            self.config.threshold_steps,
        )?;
        info!(
            "Best threshold: {:.2} (F1={:.4})",
            best_threshold.threshold, best_threshold.f1
        );
        if best_threshold.threshold != SERVING_THRESHOLD {
            warn!(
                "Swept threshold {:.2} differs from the serving threshold {SERVING_THRESHOLD}",
                best_threshold.threshold
            );
        }

        let test_labels = test_set.labels();
        let test_probs = model.predict_proba_batch(&test_set.features());
        let test = TestMetrics {
            roc_auc: roc_auc(&test_probs, &test_labels)?,
            f1: f1_score(&test_probs, &test_labels, SERVING_THRESHOLD)?,
            brier: brier_score(&test_probs, &test_labels)?,
        };
        info!("Test ROC AUC: {:.4}", test.roc_auc);
        info!("Test F1 @ {SERVING_THRESHOLD}: {:.4}", test.f1);
        info!("Test Brier score: {:.4}", test.brier);

        let report = TrainingReport {
            crate_version: crate::VERSION.to_string(),
            created_at,
            seed,
            rows: RowCounts {
                loaded: dataset.len(),
                deduplicated: dataset.len(),
                train: train_set.len(),
                calibration: calibration_set.len(),
                threshold: threshold_set.len(),
                test: test_set.len(),
            },
            best_threshold,
            serving_threshold: SERVING_THRESHOLD,
            test,
            calibrator_a: model.calibrator.a,
            calibrator_b: model.calibrator.b,
            feature_importances: FEATURE_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .zip(fitted.feature_importances)
                .collect(),
            artifact_hash: None,
        };

        Ok(TrainingOutcome { model, report })
    }

    /// Write the artifact, its hash sidecar and the training report.
    ///
    /// Returns the report path.
    pub fn save(&self, outcome: &mut TrainingOutcome) -> Result<PathBuf> {
        let artifact = &self.config.output_path;
        let digest = outcome.model.save(artifact)?;
        info!("Saved model to: {} (blake3 {})", artifact.display(), digest);
        outcome.report.artifact_hash = Some(digest);

        let path = report_path(artifact);
        fs::write(&path, canonical_json_string(&outcome.report)?)?;
        info!("Saved training report to: {}", path.display());
        Ok(path)
    }

    /// Run every stage and persist the results
    pub fn run(&self) -> Result<TrainingOutcome> {
        let (dataset, loaded) = self.load_dataset()?;
        let mut outcome = self.fit(&dataset)?;
        outcome.report.rows.loaded = loaded;
        self.save(&mut outcome)?;
        Ok(outcome)
    }
}

/// Stratified split of a dataset into (kept, held out)
fn partition(dataset: &Dataset, held_out_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
    let split = stratified_split(&dataset.labels(), held_out_fraction, seed)?;
    Ok((dataset.select(&split.train), dataset.select(&split.test)))
}
