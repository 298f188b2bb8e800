//! Driver Configuration
//!
//! Process-wide run limits and polling settings, read once when a driver
//! is built. Loaded from YAML:
//!
//! ```yaml
//! workflow:
//!   max_steps: 50
//!   timeout: 720        # minutes a pause may wait for input
//! poll_interval_ms: 1000
//! reason_limit: 100
//! ```
//!
//! # Config File Resolution
//!
//! 1. `FLOWDRIVER_CONFIG` environment variable
//! 2. `flowdriver.yaml` next to the executable
//! 3. `flowdriver.yaml` in the current directory

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "flowdriver.yaml";

/// Lazily-resolved default config file location.
pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(path) = std::env::var("FLOWDRIVER_CONFIG") {
        debug!("Using config from FLOWDRIVER_CONFIG: {}", path);
        return PathBuf::from(path);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let prod_path = exe_dir.join(CONFIG_FILE_NAME);
            if prod_path.exists() {
                debug!("Using config next to executable: {}", prod_path.display());
                return prod_path;
            }
        }
    }

    PathBuf::from(CONFIG_FILE_NAME)
});

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Limits handed to every engine the driver constructs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunLimits {
    /// Maximum node executions per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Minutes a single pause may wait for user input
    #[serde(default = "default_timeout", rename = "timeout")]
    pub timeout_minutes: u64,
}

fn default_max_steps() -> u32 {
    50
}

fn default_timeout() -> u64 {
    720
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            timeout_minutes: default_timeout(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DriverConfig {
    #[serde(default)]
    pub workflow: RunLimits,

    /// Sleep between polls while a run waits for input
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum characters of an unexpected error persisted as the reason
    #[serde(default = "default_reason_limit")]
    pub reason_limit: usize,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_reason_limit() -> usize {
    100
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            workflow: RunLimits::default(),
            poll_interval_ms: default_poll_interval_ms(),
            reason_limit: default_reason_limit(),
        }
    }
}

impl DriverConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: DriverConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads config from a file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            "Loaded config from {} (max steps: {}, timeout: {} min)",
            path.display(),
            config.workflow.max_steps,
            config.workflow.timeout_minutes
        );
        Ok(config)
    }

    /// Loads config from the resolved default location.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&*CONFIG_PATH)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.reason_limit == 0 {
            return Err(ConfigError::Invalid(
                "reason_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
