//! Application configuration using Figment.
//!
//! Configuration is loaded from:
//! 1. `plotkit.toml` (or a path given on the command line)
//! 2. Environment variables prefixed with `PLOTKIT_`, nested keys separated
//!    by a double underscore (`PLOTKIT_APPLICATION__LOG_LEVEL=debug`)
//!
//! Every section has defaults, so a missing file yields a usable config.
//!
//! # Example
//! ```no_run
//! use plotkit::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("Manifest paths: {:?}", config.manifests.search_paths);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::tracing_setup::OutputFormat;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use plotkit_core::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "plotkit.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PLOTKIT_";

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Where driver manifests are found
    #[serde(default)]
    pub manifests: ManifestConfig,
    /// Register the built-in protocols, transports and driver
    #[serde(default = "default_builtins")]
    pub builtins: bool,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: OutputFormat,
}

/// Manifest search configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Search paths in priority order (first = highest priority)
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

fn default_name() -> String {
    "plotkit".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_builtins() -> bool {
    true
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: OutputFormat::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            manifests: ManifestConfig::default(),
            builtins: default_builtins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `plotkit.toml` and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file path and the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    /// The provider chain used by [`AppConfig::load_from`].
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> DeviceResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DeviceError::Config(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for path in &self.manifests.search_paths {
            if path.as_os_str().is_empty() {
                return Err(DeviceError::Config(
                    "Manifest search path cannot be empty".to_string(),
                ));
            }
            if !seen.insert(path) {
                return Err(DeviceError::Config(format!(
                    "Duplicate manifest search path: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}
