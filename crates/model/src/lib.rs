//! winerate model
//!
//! Shared between the trainer (producer) and the prediction service
//! (consumer): the feature schema, tree and forest inference, the
//! sigmoid calibrator and the binary artifact format.

pub mod calibration;
pub mod errors;
pub mod features;
pub mod forest;
pub mod model;
pub mod serde_canon;
pub mod tree;

pub use calibration::SigmoidCalibrator;
pub use errors::{ModelError, Result};
pub use features::{
    normalize_column_name, select_features, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT,
    GOOD_QUALITY_ABOVE, MEASUREMENT_COLUMNS, QUALITY_COLUMN, TARGET_COLUMN,
};
pub use forest::{ForestParams, RandomForest};
pub use model::{
    artifact_digest, hash_path, CalibratedModel, ModelMetadata, ARTIFACT_VERSION,
    DEFAULT_ARTIFACT_PATH,
};
pub use serde_canon::canonical_json_string;
pub use tree::{Node, Tree};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
