//! winerate trainer
//!
//! Reproducible offline training of the wine quality classifier: CSV
//! loading and cleaning, stratified splits, random forest fitting,
//! sigmoid calibration, threshold search and evaluation.

pub mod calibration;
pub mod cart;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod split;

pub use calibration::PlattFitter;
pub use cart::{CartBuilder, TreeConfig};
pub use config::TrainerConfig;
pub use dataset::{Dataset, WineRow};
pub use errors::{Result, TrainerError};
pub use forest::{sqrt_features, FittedForest, ForestTrainer};
pub use metrics::{
    brier_score, f1_score, roc_auc, threshold_sweep, ConfusionCounts, ThresholdSearch,
};
pub use pipeline::{
    report_path, RowCounts, TestMetrics, TrainingOutcome, TrainingPipeline, TrainingReport,
    SERVING_THRESHOLD,
};
pub use split::{stratified_split, SplitIndices};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
