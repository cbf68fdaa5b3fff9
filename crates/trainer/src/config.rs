//! Trainer configuration
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! then `WINERATE_*` environment variables. CLI flags are applied on top
//! by the binary.

use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use winerate_model::{ForestParams, DEFAULT_ARTIFACT_PATH};

use crate::errors::{Result, TrainerError};
use crate::forest::sqrt_features;
use crate::metrics::SWEEP_STEPS;

/// Config file picked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/trainer.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "WINERATE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerConfig {
    pub red_path: PathBuf,
    pub white_path: PathBuf,
    /// Artifact destination; the hash and report are written beside it
    pub output_path: PathBuf,
    pub seed: u64,

    /// Share of all rows held out for the final evaluation
    pub test_fraction: f64,
    /// Share of the remaining rows used for calibration and threshold search
    pub validation_fraction: f64,
    /// Share of the validation rows used for the threshold sweep
    pub threshold_fraction: f64,
    pub threshold_steps: usize,

    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
    pub bootstrap: bool,

    pub log_level: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let forest = ForestParams::default();
        Self {
            red_path: PathBuf::from("./wine_quality_data/winequality_red.csv"),
            white_path: PathBuf::from("./wine_quality_data/winequality_white.csv"),
            output_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            seed: 42,
            test_fraction: 0.2,
            validation_fraction: 0.25,
            threshold_fraction: 0.5,
            threshold_steps: SWEEP_STEPS,
            n_estimators: forest.n_estimators,
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
            min_samples_leaf: forest.min_samples_leaf,
            max_features: sqrt_features(winerate_model::FEATURE_COUNT),
            bootstrap: forest.bootstrap,
            log_level: "info".to_string(),
        }
    }
}

impl TrainerConfig {
    /// Resolve configuration from defaults, file and environment.
    ///
    /// An explicit `path` must exist; otherwise [`DEFAULT_CONFIG_PATH`] is
    /// read only when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(TrainerError::Config(format!(
                    "configuration file {} not found (specified via --config)",
                    path.display()
                )))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };

        let defaults = Config::try_from(&TrainerConfig::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(file) = &file {
            builder = builder.add_source(ConfigFile::from(file.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: TrainerConfig = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("test_fraction", self.test_fraction),
            ("validation_fraction", self.validation_fraction),
            ("threshold_fraction", self.threshold_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(TrainerError::Config(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if self.n_estimators == 0 {
            return Err(TrainerError::Config("n_estimators must be positive".to_string()));
        }
        if self.max_features == 0 {
            return Err(TrainerError::Config("max_features must be positive".to_string()));
        }
        if self.threshold_steps < 2 {
            return Err(TrainerError::Config("threshold_steps must be at least 2".to_string()));
        }
        Ok(())
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            seed: self.seed,
        }
    }
}

fn config_error(err: config::ConfigError) -> TrainerError {
    TrainerError::Config(err.to_string())
}
