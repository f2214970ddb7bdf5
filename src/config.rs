// Configuration loaded from the rc file (~/.taskboard/rc)
//
// The rc file holds simple `key=value` lines:
//   data.location=./board.db
//   board.persist_timeout_ms=10000

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default upper bound for one drop's write batch
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: PathBuf,
    pub persist_timeout: Duration,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to determine home directory")?;
        Ok(home.join(".taskboard"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("rc"))
    }

    /// Get the default database path
    pub fn default_data_location() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("board.db"))
    }

    /// Load configuration from the rc file, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let defaults = Config {
            data_location: Self::default_data_location()?,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
        };

        if !config_path.exists() {
            return Ok(defaults);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        Self::parse(&contents, &config_path, defaults)
    }

    /// Parse rc contents on top of `defaults`.
    /// Relative data locations resolve against the rc file's directory.
    pub fn parse(contents: &str, config_path: &Path, defaults: Config) -> Result<Self> {
        let mut config = defaults;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() {
                        config_path
                            .parent()
                            .map(|dir| dir.join(&path))
                            .unwrap_or(path)
                    } else {
                        path
                    };
                }
                "board.persist_timeout_ms" => {
                    let ms: u64 = value.parse().map_err(|_| {
                        anyhow::anyhow!(
                            "Invalid board.persist_timeout_ms '{}': expected a number of milliseconds",
                            value
                        )
                    })?;
                    config.persist_timeout = Duration::from_millis(ms);
                }
                other => {
                    log::debug!("ignoring unknown config key '{}'", other);
                }
            }
        }

        Ok(config)
    }
}
