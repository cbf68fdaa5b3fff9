use thiserror::Error;
use winerate_model::ModelError;

/// Errors returned by the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("split error: {0}")]
    Split(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("calibration error: {0}")]
    Calibration(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
