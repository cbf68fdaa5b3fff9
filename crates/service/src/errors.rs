use std::path::PathBuf;

use thiserror::Error;
use winerate_model::ModelError;

/// Errors returned by the prediction service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load model from {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated unexpectedly: {0}")]
    Server(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
