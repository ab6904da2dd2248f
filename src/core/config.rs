use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_use_system_proxy")]
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file mirroring the session keys
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `console` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Log layer selected by `logging.format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    Json,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_use_system_proxy() -> bool {
    true
}

fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("edumanager")
        .join("session.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            use_system_proxy: default_use_system_proxy(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// Anything other than `json` logs to the console; `validate()` rejects
    /// unknown formats before this is consulted
    pub fn output(&self) -> LogOutput {
        if self.format == "json" {
            LogOutput::Json
        } else {
            LogOutput::Console
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` when given; otherwise use `fallback` if it exists, or defaults.
    pub fn load(path: Option<&Path>, fallback: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if fallback.exists() => Self::from_file(fallback),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate api config
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!(
                "api.base_url '{}' must start with http:// or https://",
                self.api.base_url
            );
        }

        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be greater than 0");
        }

        // Validate storage config
        if self.storage.path.as_os_str().is_empty() {
            bail!("storage.path must not be empty");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
