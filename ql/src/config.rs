//! Configuration for the query engine.
//!
//! Config resolution order for [`Config::load`]:
//! 1. QL_CONFIG environment variable (path to a TOML file)
//! 2. `<config dir>/ql/config.toml` (XDG on Linux)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Query engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum parenthesis nesting the parser accepts.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Attribute path segments a setter never writes through.
    #[serde(default = "default_reserved_segments")]
    pub reserved_segments: Vec<String>,
}

fn default_max_depth() -> usize {
    64
}

fn default_reserved_segments() -> Vec<String> {
    vec!["__proto__".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            reserved_segments: default_reserved_segments(),
        }
    }
}

impl Config {
    /// Load config using the standard resolution order.
    pub fn load() -> Result<Self> {
        Self::load_with_override(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    /// Load config, preferring `override_path` over the config directory.
    fn load_with_override(override_path: Option<PathBuf>) -> Result<Self> {
        match override_path.or_else(default_config_path) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a TOML file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        if config.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Save config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Whether a setter may write through this path segment.
    pub fn is_reserved(&self, segment: &str) -> bool {
        self.reserved_segments.iter().any(|s| s == segment)
    }
}

/// Environment variable naming a config file.
const CONFIG_ENV: &str = "QL_CONFIG";

/// XDG config directory (via directories crate).
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ql").map(|dirs| dirs.config_dir().join("config.toml"))
}
