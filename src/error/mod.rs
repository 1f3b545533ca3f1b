//! Error handling module for okvideo
//!
//! [`OkvideoError`] is the crate-boundary error; every variant maps to one
//! process exit code.

use std::process::ExitCode;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Exit code of a clean run
pub const EXIT_OK: u8 = 0;
/// Exit code for bad arguments or configuration
pub const EXIT_USAGE: u8 = 2;
/// Exit code of a run that finished with per-item failures or was cancelled
pub const EXIT_PARTIAL: u8 = 3;
/// Exit code for fatal I/O errors
pub const EXIT_IO: u8 = 4;

/// Main error type for okvideo operations
#[derive(Error, Debug)]
pub enum OkvideoError {
    /// Invalid arguments or configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Fatal I/O error: manifest, output directory or report
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Error raised by the domain layer
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl OkvideoError {
    pub fn config(message: impl Into<String>) -> Self {
        OkvideoError::Config {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        OkvideoError::Io {
            message: message.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            OkvideoError::Config { .. } => EXIT_USAGE,
            OkvideoError::Io { .. } => EXIT_IO,
            OkvideoError::Domain(e) if e.is_io() => EXIT_IO,
            OkvideoError::Domain(DomainError::Config(_)) => EXIT_USAGE,
            OkvideoError::Domain(_) => EXIT_IO,
        }
    }

    /// Exit code for an error chain built with `anyhow` context
    ///
    /// Errors that carry no typed cause are treated as fatal I/O.
    pub fn exit_code_for(err: &anyhow::Error) -> u8 {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<OkvideoError>() {
                return e.exit_code();
            }
            if let Some(e) = cause.downcast_ref::<DomainError>() {
                return OkvideoError::Domain(e.clone()).exit_code();
            }
            if cause.downcast_ref::<std::io::Error>().is_some() {
                return EXIT_IO;
            }
        }
        EXIT_IO
    }
}

impl From<std::io::Error> for OkvideoError {
    fn from(err: std::io::Error) -> Self {
        OkvideoError::io(err.to_string())
    }
}

/// Final status of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every item succeeded
    Clean,
    /// Some items failed, or the run was cancelled
    Partial,
}

impl RunStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Clean => ExitCode::from(EXIT_OK),
            RunStatus::Partial => ExitCode::from(EXIT_PARTIAL),
        }
    }
}

/// Result type alias for okvideo operations
pub type OkvideoResult<T> = std::result::Result<T, OkvideoError>;
