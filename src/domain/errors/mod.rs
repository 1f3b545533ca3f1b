// Domain errors - Error types for the domain layer

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    /// Referenced media file, manifest or directory does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid arguments or configuration values
    #[error("Configuration error: {0}")]
    Config(String),
    /// Manifest could not be read or parsed
    #[error("Manifest error: {0}")]
    Manifest(String),
    /// A manifest row carries values the task cannot act on
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    /// Report could not be written
    #[error("Report error: {0}")]
    Report(String),
    /// External transcode/trim invocation failed
    #[error("Transform failed: {0}")]
    TransformFailed(String),
    /// External download exhausted its retry budget
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// External process could not be spawned
    #[error("Failed to launch {program}: {message}")]
    Spawn { program: String, message: String },
    /// File system operation failed
    #[error("File system error: {0}")]
    FsFail(String),
}

impl DomainError {
    /// Whether the error is a fatal batch-level I/O failure rather than bad input
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound(_)
                | DomainError::Manifest(_)
                | DomainError::Report(_)
                | DomainError::FsFail(_)
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}
