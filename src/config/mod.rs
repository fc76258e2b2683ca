//! Configuration management.
//!
//! Settings layer in increasing precedence: built-in defaults, an optional
//! TOML file, `ALEXANDRIA_*` environment variables, then CLI flags applied by
//! the binary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote service settings
    #[serde(default)]
    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
        }
    }
}

/// Settings for the search/parse service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base address of the service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// File names probed when no explicit config path is given.
const CONFIG_FILE_NAME: &str = "alexandria.toml";

/// Locate a configuration file: the working directory first, then the user
/// config directory.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("alexandria").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load configuration from a file, layered with environment variables.
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("ALEXANDRIA").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment variables alone.
pub fn load_env_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix("ALEXANDRIA").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Get the effective configuration: discovered file if any, else environment
/// and defaults.
pub fn get_config() -> Config {
    match find_config_file() {
        Some(path) => load_config(&path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
            Config::default()
        }),
        None => load_env_config().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:5001");
        assert_eq!(config.service.timeout_secs, 30);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.service.base_url, config.service.base_url);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[service]\nbase_url = \"http://books.example:8080\"\n").unwrap();
        assert_eq!(parsed.service.base_url, "http://books.example:8080");
        assert_eq!(parsed.service.timeout_secs, 30);
    }
}
