/// Application configuration management
/// Stores settings in ~/.config/backrest-cli/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::registry::Instance;
use crate::core::scheduler::DEFAULT_CLEANUP_SCHEDULE;

pub const DEFAULT_EXECUTABLE: &str = "/usr/bin/pgbackrest";
pub const DEFAULT_CONF_PATH: &str = "/etc/pgbackrest/pgbackrest.conf";
pub const DEFAULT_LOG_PATH: &str = "/var/log/pgbackrest/pgbackrest.log";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the backup tool executable
    pub executable: Option<String>,
    /// Path to the tool's configuration file
    pub conf_path: Option<String>,
    /// Path to the tool's log file
    pub log_path: Option<String>,
    /// Cron schedule for retention cleanup
    pub cleanup_schedule: Option<String>,
    /// Subprocess timeout in seconds; unset means no timeout
    pub timeout_secs: Option<u64>,
    /// Instances seeded into the registry at startup
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl AppConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        let config_dir = PathBuf::from(home).join(".config").join("backrest-cli");

        // Create directory if it doesn't exist
        fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file; a missing file yields defaults
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Backup tool executable; BACKREST_EXECUTABLE overrides the config file
    pub fn executable(&self) -> String {
        std::env::var("BACKREST_EXECUTABLE")
            .ok()
            .or_else(|| self.executable.clone())
            .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string())
    }

    /// Tool configuration file; BACKREST_CONF overrides the config file
    pub fn conf_path(&self) -> String {
        std::env::var("BACKREST_CONF")
            .ok()
            .or_else(|| self.conf_path.clone())
            .unwrap_or_else(|| DEFAULT_CONF_PATH.to_string())
    }

    /// Tool log file; BACKREST_LOGS overrides the config file
    pub fn log_path(&self) -> String {
        std::env::var("BACKREST_LOGS")
            .ok()
            .or_else(|| self.log_path.clone())
            .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string())
    }

    pub fn cleanup_schedule(&self) -> String {
        self.cleanup_schedule
            .clone()
            .unwrap_or_else(|| DEFAULT_CLEANUP_SCHEDULE.to_string())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
