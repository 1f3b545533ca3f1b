// TOML config adapter - Settings file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::fetch_youtube_dl::RetryPolicy;
use crate::domain::errors::*;

/// Config files probed, in order, when no `--config` path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["okvideo.toml", "config/okvideo.toml"];

/// Settings read from a TOML file, filled with defaults for missing keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tools: ToolPaths,
    pub batch: BatchSettings,
    pub fetch: FetchSettings,
    pub logging: LoggingSettings,
}

/// Locations of the external binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub youtube_dl: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            youtube_dl: "youtube-dl".to_string(),
        }
    }
}

/// Worker pool and scratch space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Worker pool size; defaults to the number of CPUs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Root for per-item temporary directories; defaults to the system temp dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmp_dir: Option<PathBuf>,
}

/// Download retry budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub url_base: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            url_base: crate::adapters::fetch_youtube_dl::DEFAULT_URL_BASE.to_string(),
        }
    }
}

impl From<&FetchSettings> for RetryPolicy {
    fn from(fetch: &FetchSettings) -> Self {
        RetryPolicy {
            attempts: fetch.attempts.max(1),
            base_delay: Duration::from_millis(fetch.backoff_base_ms),
            max_delay: Duration::from_millis(fetch.backoff_cap_ms),
        }
    }
}

/// Logging defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
    /// Print the emitting module next to each event
    pub target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            target: false,
        }
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Settings file to read, if any
    ///
    /// An explicit path must exist. Without one, the default locations are
    /// tried in order.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>, DomainError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(DomainError::Config(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }
        Ok(DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file()))
    }

    /// Load settings, falling back to built-in defaults when no file exists
    pub fn load(explicit: Option<&Path>) -> Result<Settings, DomainError> {
        match Self::locate(explicit)? {
            Some(path) => Self::load_file(&path),
            None => Ok(Settings::default()),
        }
    }

    /// Load settings from one file
    pub fn load_file(path: &Path) -> Result<Settings, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| match e {
            DomainError::Config(msg) => DomainError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Settings, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Serialize settings back to TOML
    pub fn serialize(settings: &Settings) -> Result<String, DomainError> {
        toml::to_string_pretty(settings)
            .map_err(|e| DomainError::Config(format!("Failed to serialize config: {}", e)))
    }
}
