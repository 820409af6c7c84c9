//! Exporter configuration.
//!
//! A JSON document naming *modules*: sets of collectors plus the command
//! settings used when a scrape asks for that module.
//!
//! ```json
//! {
//!   "max_concurrency": 8,
//!   "freeipmi_path": "/usr/sbin",
//!   "modules": {
//!     "default": { "collectors": ["sm-lan-mode", "chassis-status"], "timeout_ms": 10000 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collectors::{COLLECTOR_NAMES, lookup_name};
use crate::runner::{DEFAULT_COMMAND_TIMEOUT, FreeIpmiRunner};

/// Module used when a scrape does not name one.
pub const DEFAULT_MODULE: &str = "default";

/// Default number of (collector, target) units run at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("module {module}: unknown collector {collector:?}")]
    UnknownCollector { module: String, collector: String },
    #[error("module {module}: {reason}")]
    InvalidModule { module: String, reason: &'static str },
    #[error("max_concurrency must be at least 1")]
    InvalidConcurrency,
}

/// Collectors and command settings for one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Collector names, run in this order.
    pub collectors: Vec<String>,
    /// Per-command timeout in milliseconds.
    pub timeout_ms: u64,
    /// FreeIPMI `--driver-type` for remote targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_type: Option<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            collectors: COLLECTOR_NAMES.iter().map(|n| n.to_string()).collect(),
            timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
            driver_type: None,
        }
    }
}

impl ModuleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self, module: &str) -> Result<(), ConfigError> {
        if self.collectors.is_empty() {
            return Err(ConfigError::InvalidModule {
                module: module.to_string(),
                reason: "no collectors configured",
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidModule {
                module: module.to_string(),
                reason: "timeout_ms must be positive",
            });
        }
        if let Some(unknown) = self.collectors.iter().find(|c| lookup_name(c).is_none()) {
            return Err(ConfigError::UnknownCollector {
                module: module.to_string(),
                collector: unknown.clone(),
            });
        }
        Ok(())
    }
}

/// Top-level exporter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Upper bound on concurrently running units of one scrape.
    pub max_concurrency: usize,
    /// Directory holding the FreeIPMI binaries; `PATH` lookup when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeipmi_path: Option<PathBuf>,
    pub modules: BTreeMap<String, ModuleConfig>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(DEFAULT_MODULE.to_string(), ModuleConfig::default());
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            freeipmi_path: None,
            modules,
        }
    }
}

impl ExporterConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Self>(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        for (name, module) in &self.modules {
            module.validate(name)?;
        }
        Ok(())
    }

    /// Look up a module; `None` selects [`DEFAULT_MODULE`].
    ///
    /// A config without an explicit `default` module still answers for it
    /// with every collector enabled.
    pub fn module(&self, name: Option<&str>) -> Option<ModuleConfig> {
        let name = name.unwrap_or(DEFAULT_MODULE);
        match self.modules.get(name) {
            Some(module) => Some(module.clone()),
            None if name == DEFAULT_MODULE => Some(ModuleConfig::default()),
            None => None,
        }
    }

    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        if !self.modules.contains_key(DEFAULT_MODULE) {
            names.push(DEFAULT_MODULE.to_string());
        }
        names
    }

    /// Command runner configured for `module`.
    pub fn runner_for(&self, module: &ModuleConfig) -> FreeIpmiRunner {
        FreeIpmiRunner::new()
            .with_bin_dir(self.freeipmi_path.clone())
            .with_timeout(module.timeout())
            .with_driver_type(module.driver_type.clone())
    }
}

/// Read, parse and validate a config file.
pub fn load_config_from_path(path: &Path) -> Result<ExporterConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ExporterConfig::from_json(&raw)
}
