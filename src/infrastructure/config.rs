//! Configuration infrastructure
//!
//! Settings are layered: built-in defaults, then the JSON config file in the
//! user config directory, then `SELLER_SYNC__*` environment variables
//! (e.g. `SELLER_SYNC__BACKEND__BASE_URL`).

#![allow(clippy::uninlined_format_args)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::domain::constants::backend::{
    DEFAULT_MAX_RANGE_DAYS, DEFAULT_MAX_REQUESTS_PER_SECOND, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_VIEW_CACHE_TTL_SECS,
};

const APP_DIR_NAME: &str = "seller-sync";
const CONFIG_FILE_NAME: &str = "seller_sync_config.json";
const ENV_PREFIX: &str = "SELLER_SYNC";
const KNOWN_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// REST backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the sales API, e.g. `https://api.example.com/api`
    pub base_url: String,

    /// Bearer token sent with every request
    pub api_token: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Client-side rate limit; 0 disables limiting
    pub max_requests_per_second: u32,

    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Longest range accepted for a single run
    pub max_range_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of cached sales views in seconds
    pub ttl_secs: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Offset from UTC used for log timestamps (marketplace local time)
    pub utc_offset_hours: i32,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
            user_agent: format!("seller-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_VIEW_CACHE_TTL_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            utc_offset_hours: -3,
            max_files: 7,
            auto_cleanup_logs: true,
            module_filters: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, then `path` (optional), then environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = url::Url::parse(&self.backend.base_url).map_err(|e| ConfigError::Validation {
            message: format!("backend.base_url {:?} is not a valid URL: {}", self.backend.base_url, e),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                message: format!("backend.base_url must be http(s), got {}", base.scheme()),
            });
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                message: "backend.request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.sync.max_range_days == 0 {
            return Err(ConfigError::Validation {
                message: "sync.max_range_days must be greater than 0".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation {
                message: format!("logging.level {:?} is not one of {:?}", self.logging.level, KNOWN_LOG_LEVELS),
            });
        }

        if !self.logging.console_output && !self.logging.file_output {
            return Err(ConfigError::Validation {
                message: "at least one of logging.console_output / logging.file_output must be enabled"
                    .to_string(),
            });
        }

        Ok(())
    }
}

/// Locates, loads and persists the configuration file
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME);
        Ok(config_dir)
    }

    /// Manager for the default config location
    pub fn new() -> anyhow::Result<Self> {
        let config_path = Self::get_config_dir()?.join(CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load the layered configuration; a missing file means defaults.
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = AppConfig::load_from(Some(&self.config_path))
            .with_context(|| format!("Failed to load configuration from {:?}", self.config_path))?;
        info!("Loaded configuration (file: {:?})", self.config_path);
        Ok(config)
    }

    /// Write defaults on first run, otherwise load the existing file.
    pub async fn initialize_on_first_run(&self) -> anyhow::Result<AppConfig> {
        if self.config_path.exists() {
            return self.load_config();
        }

        info!("🎉 First run detected - writing default configuration");
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        Ok(default_config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> anyhow::Result<()> {
        config.validate()?;
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }
        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write configuration to {:?}", self.config_path))?;
        info!("Configuration saved to: {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
