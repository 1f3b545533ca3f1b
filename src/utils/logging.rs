//! Logging setup
//!
//! Installs one global `tracing` subscriber writing to stderr, so reports
//! printed on stdout stay machine-readable.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::domain::errors::DomainError;

/// Token written at the end of every completed batch run
///
/// `check-logs` looks for it to find runs that died before finishing.
pub const SUCCESS_TOKEN: &str = "Successful execution";

/// Subscriber output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human oriented
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON objects
    Json,
}

impl FromStr for LogFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "full" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(DomainError::Config(format!(
                "Invalid log format: {}. Expected pretty, compact or json",
                other
            ))),
        }
    }
}

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Print the emitting module next to each event
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            target: false,
        }
    }
}

impl LoggingConfig {
    /// Build a config from textual level and format
    pub fn from_strings(level: &str, format: &str) -> Result<Self, DomainError> {
        let level = Level::from_str(level.trim()).map_err(|_| {
            DomainError::Config(format!(
                "Invalid log level: {}. Expected trace, debug, info, warn or error",
                level
            ))
        })?;
        Ok(Self {
            level,
            format: format.parse()?,
            target: false,
        })
    }

    /// Filter for the configured level; `RUST_LOG` wins when it is set
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_ascii_lowercase()))
    }

    /// Install the global subscriber
    ///
    /// A second call leaves the first subscriber in place.
    pub fn init(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.target)
            .with_writer(std::io::stderr);

        let _ = match self.format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    }
}
