use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use chartreg_driver::{create_driver, DriverParameters};
use chartreg_store::SpaceManager;

/// Top-level server configuration, loaded from a yaml file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:5000`.
    pub listen: String,
    pub manager: ManagerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".to_string(),
            manager: ManagerConfig::default(),
        }
    }
}

/// Storage manager selection and parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Manager implementation name; only `simple` is known.
    pub name: String,
    pub parameters: ManagerParameters,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: "simple".to_string(),
            parameters: ManagerParameters::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerParameters {
    pub storagedriver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rootdirectory: Option<PathBuf>,
    /// Resource locker implementation; only `memory` is known.
    #[serde(default = "default_resource_locker")]
    pub resourcelocker: String,
    /// Extra parameters for the resource locker. The memory locker takes
    /// none; the key exists so configs can carry them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockerparameters: Option<serde_yaml::Value>,
    /// Lock acquisition bound in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub locktimeout: u64,
}

impl Default for ManagerParameters {
    fn default() -> Self {
        Self {
            storagedriver: "inmemory".to_string(),
            rootdirectory: None,
            resourcelocker: default_resource_locker(),
            lockerparameters: None,
            locktimeout: default_lock_timeout_ms(),
        }
    }
}

fn default_resource_locker() -> String {
    "memory".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    30_000
}

/// Errors raised while loading configuration or building the manager.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown storage manager: {0}")]
    UnknownManager(String),
    #[error("unknown resource locker: {0}")]
    UnknownLocker(String),
    #[error("driver error: {0}")]
    Driver(#[from] chartreg_driver::DriverError),
}

impl ServerConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Build the configured space manager.
    pub fn build_manager(&self) -> Result<SpaceManager, ConfigError> {
        if self.manager.name != "simple" {
            return Err(ConfigError::UnknownManager(self.manager.name.clone()));
        }
        let params = &self.manager.parameters;
        if params.resourcelocker != "memory" {
            return Err(ConfigError::UnknownLocker(params.resourcelocker.clone()));
        }
        let driver = create_driver(
            &params.storagedriver,
            &DriverParameters {
                root_directory: params.rootdirectory.clone(),
            },
        )?;
        Ok(SpaceManager::new(
            driver,
            Duration::from_millis(params.locktimeout),
        ))
    }
}
