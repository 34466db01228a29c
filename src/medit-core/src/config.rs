use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    /// Location of the library store; defaults to the data directory.
    #[serde(default)]
    pub library_path: Option<PathBuf>,
    #[serde(default)]
    pub edit: EditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            library_path: None,
            edit: EditConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Settings for the interactive edit session. Field lists are
/// whitespace-separated field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditConfig {
    /// Default fields offered when editing items.
    #[serde(default = "default_item_fields")]
    pub item_fields: String,
    /// Default fields offered when editing albums.
    #[serde(default = "default_album_fields")]
    pub album_fields: String,
    /// Fields whose edits are silently rejected per record.
    #[serde(default = "default_ignore_fields")]
    pub ignore_fields: String,
    /// Editor command; $VISUAL/$EDITOR are consulted when unset.
    #[serde(default)]
    pub editor: Option<String>,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            item_fields: default_item_fields(),
            album_fields: default_album_fields(),
            ignore_fields: default_ignore_fields(),
            editor: None,
        }
    }
}

impl EditConfig {
    pub fn item_fields(&self) -> Vec<String> {
        as_str_seq(&self.item_fields)
    }

    pub fn album_fields(&self) -> Vec<String> {
        as_str_seq(&self.album_fields)
    }

    pub fn ignore_fields(&self) -> Vec<String> {
        as_str_seq(&self.ignore_fields)
    }
}

fn as_str_seq(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    /// Enables a daily-rolling log file with this stem when set.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_item_fields() -> String {
    "track title artist album".to_owned()
}

fn default_album_fields() -> String {
    "album albumartist".to_owned()
}

fn default_ignore_fields() -> String {
    "id path".to_owned()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}
