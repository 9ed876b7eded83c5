//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory; a missing file yields
//! the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::feed::DEFAULT_WINDOW_DAYS;

/// Default group code alphabet: uppercase letters and digits.
pub const DEFAULT_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Database settings
    pub database: DatabaseSettings,
    /// Group code settings
    pub groups: GroupSettings,
    /// Activity feed settings
    pub feed: FeedSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            database: DatabaseSettings::default(),
            groups: GroupSettings::default(),
            feed: FeedSettings::default(),
        }
    }
}

impl AppConfig {
    /// Full path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database.file_name)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.code_length == 0 {
            return Err(ConfigError::Invalid(
                "groups.code_length must be at least 1".to_string(),
            ));
        }
        if self.groups.code_alphabet.is_empty() {
            return Err(ConfigError::Invalid(
                "groups.code_alphabet must not be empty".to_string(),
            ));
        }
        if self.groups.code_alphabet.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "groups.code_alphabet must not contain whitespace".to_string(),
            ));
        }
        if self.groups.max_code_attempts == 0 {
            return Err(ConfigError::Invalid(
                "groups.max_code_attempts must be at least 1".to_string(),
            ));
        }
        if self.feed.window_days < 0 {
            return Err(ConfigError::Invalid(
                "feed.window_days must not be negative".to_string(),
            ));
        }
        if self.database.file_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// File name inside the data directory
    pub file_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            file_name: "fieldtest.db".to_string(),
        }
    }
}

/// Group join code settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    /// Number of characters in a join code
    pub code_length: usize,
    /// Characters a join code is drawn from
    pub code_alphabet: String,
    /// Attempts before group creation gives up on finding a free code
    pub max_code_attempts: u32,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            code_length: 5,
            code_alphabet: DEFAULT_CODE_ALPHABET.to_string(),
            max_code_attempts: 32,
        }
    }
}

/// Activity feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Rolling window in days
    pub window_days: i64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "fieldtest", "FieldTest")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load application configuration from a specific file.
///
/// The data directory defaults to the file's parent directory.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.data_dir = data_dir;
    config.validate()?;

    Ok(config)
}

/// Save application configuration to a file.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
