//! Wine feature schema
//!
//! Column names follow the normalized CSV headers (lowercase, spaces
//! replaced by underscores). The model consumes [`FEATURE_COLUMNS`] in
//! exactly this order.

use serde_json::{Map, Value};

use crate::errors::{ModelError, Result};

/// Number of features the model consumes
pub const FEATURE_COUNT: usize = 8;

/// Features selected for training and serving, in model order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "volatile_acidity",
    "citric_acid",
    "free_sulfur_dioxide",
    "total_sulfur_dioxide",
    "density",
    "ph",
    "sulphates",
    "alcohol",
];

/// All physicochemical measurement columns present in the source data
pub const MEASUREMENT_COLUMNS: [&str; 11] = [
    "fixed_acidity",
    "volatile_acidity",
    "citric_acid",
    "residual_sugar",
    "chlorides",
    "free_sulfur_dioxide",
    "total_sulfur_dioxide",
    "density",
    "ph",
    "sulphates",
    "alcohol",
];

/// Raw quality score column, replaced by the binary label during training
pub const QUALITY_COLUMN: &str = "quality";

/// Binary target column name
pub const TARGET_COLUMN: &str = "good_wine";

/// Quality strictly above this value is considered a good wine
pub const GOOD_QUALITY_ABOVE: f64 = 5.0;

/// Ordered feature values for a single wine
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Normalize a raw CSV header: lowercase, spaces become underscores
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim().trim_matches('"').to_lowercase().replace(' ', "_")
}

/// Select the model features from a JSON record.
///
/// Values may be JSON numbers or strings holding a number. Fields that are
/// not model features are ignored.
pub fn select_features(record: &Value) -> Result<FeatureVector> {
    let object = record
        .as_object()
        .ok_or_else(|| ModelError::InvalidRecord(format!("expected JSON object, got {record}")))?;
    select_from_map(object)
}

fn select_from_map(object: &Map<String, Value>) -> Result<FeatureVector> {
    let mut features = [0.0; FEATURE_COUNT];
    for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
        let value = object
            .get(name)
            .ok_or_else(|| ModelError::MissingFeature(name.to_string()))?;
        *slot = numeric_value(name, value)?;
    }
    Ok(features)
}

fn numeric_value(name: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ModelError::InvalidFeature {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
