//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                               │
//! │     --database ./drawer.db                                              │
//! │                                                                         │
//! │  2. Environment Variables                                               │
//! │     DRAWER_DATABASE_PATH=/var/lib/drawer/drawer.db                      │
//! │     DRAWER_UTC_OFFSET_MINUTES=-300                                      │
//! │     DRAWER_MAX_CONNECTIONS=4                                            │
//! │     DRAWER_LOG_FILTER=info,drawer=debug                                 │
//! │                                                                         │
//! │  3. TOML Config File                                                    │
//! │     ~/.config/drawer/drawer.toml (Linux)                                │
//! │     ~/Library/Application Support/com.drawer.drawer/drawer.toml (macOS) │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # drawer.toml
//! [database]
//! path = "/var/lib/drawer/drawer.db"
//! max_connections = 4
//!
//! [business]
//! utc_offset_minutes = -300   # business date is taken at UTC-05:00
//!
//! [logging]
//! filter = "info,sqlx=warn"
//! ```

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use drawer_engine::config::MAX_UTC_OFFSET_MINUTES;
use drawer_engine::EngineConfig;

const CONFIG_FILE_NAME: &str = "drawer.toml";
const DATABASE_FILE_NAME: &str = "drawer.db";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Falls back to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    4
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Settings that decide which calendar day a session belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessSettings {
    /// Offset of the pharmacy's local time from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins over it.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub business: BusinessSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.business.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "business.utc_offset_minutes must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES, self.business.utc_offset_minutes
            )));
        }

        Ok(())
    }

    /// Applies `DRAWER_*` overrides read through `lookup`.
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DRAWER_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup("DRAWER_MAX_CONNECTIONS") {
            match raw.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %raw, "Ignoring unparsable DRAWER_MAX_CONNECTIONS"),
            }
        }

        if let Some(raw) = lookup("DRAWER_UTC_OFFSET_MINUTES") {
            match raw.parse::<i32>() {
                Ok(minutes) => self.business.utc_offset_minutes = minutes,
                Err(_) => warn!(value = %raw, "Ignoring unparsable DRAWER_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(filter) = lookup("DRAWER_LOG_FILTER") {
            self.logging.filter = filter;
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "drawer", "drawer")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Configured database file, or `drawer.db` in the platform data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    pub fn engine_config(&self) -> ConfigResult<EngineConfig> {
        EngineConfig::from_offset_minutes(self.business.utc_offset_minutes)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
