//! Error types for the model crate

use thiserror::Error;

/// Errors raised while building, validating, persisting or querying a model
#[derive(Error, Debug)]
pub enum ModelError {
    /// Model validation failed
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    /// A required feature was absent from the input record
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// A feature value could not be interpreted as a number
    #[error("Invalid value for feature {name}: {value}")]
    InvalidFeature { name: String, value: String },

    /// The input record was not a JSON object
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Stored digest does not match the artifact bytes
    #[error("Artifact hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary artifact encoding error
    #[error("Artifact encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
