//! Service configuration
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! then `WINERATE_*` environment variables. CLI flags are applied on top
//! by the binary.

use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use winerate_model::DEFAULT_ARTIFACT_PATH;

use crate::errors::{Result, ServiceError};

/// Config file picked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/service.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "WINERATE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub model_path: PathBuf,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            model_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ServiceError::Config(format!(
                    "configuration file {} not found (specified via --config)",
                    path.display()
                )))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };

        let defaults = Config::try_from(&ServiceConfig::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(file) = &file {
            builder = builder.add_source(ConfigFile::from(file.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)
    }
}

fn config_error(err: config::ConfigError) -> ServiceError {
    ServiceError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::NamedTempFile;

    /// Environment variables are process-wide; tests that load config hold this.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.model_path, PathBuf::from("./model_artifact/wine_rate_v1.bin"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "listen_addr = \"0.0.0.0:9000\"").unwrap();

        let _guard = env_lock();
        let config = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "listen_addr = \"0.0.0.0:9000\"").unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();

        let _guard = env_lock();
        std::env::set_var("WINERATE_LISTEN_ADDR", "127.0.0.1:9100");
        let loaded = ServiceConfig::load(Some(file.path()));
        std::env::remove_var("WINERATE_LISTEN_ADDR");

        let config = loaded.unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9100");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let _guard = env_lock();
        assert!(ServiceConfig::load(Some(Path::new("/nonexistent/service.toml"))).is_err());
    }
}
