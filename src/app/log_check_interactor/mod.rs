// Log-check interactor - Finds batch logs that never reached completion

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::utils::logging::SUCCESS_TOKEN;

/// Default extension of scanned log files
pub const DEFAULT_LOG_EXTENSION: &str = ".out";

/// Result of scanning a log directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogCheckReport {
    /// Number of log files read
    pub parsed: usize,
    /// Job identifiers whose log lacks the success token, sorted
    pub failed_ids: Vec<String>,
}

impl LogCheckReport {
    pub fn is_clean(&self) -> bool {
        self.failed_ids.is_empty()
    }
}

/// Interactor for the check-logs command
pub struct LogCheckInteractor {
    extension: String,
    token: String,
}

impl Default for LogCheckInteractor {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_EXTENSION, SUCCESS_TOKEN)
    }
}

impl LogCheckInteractor {
    /// Create a log-check interactor; the extension may be given with or
    /// without its leading dot
    pub fn new(extension: &str, token: impl Into<String>) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            token: token.into(),
        }
    }

    /// Job identifier of a log file: the last `-`-separated token of its stem
    pub fn job_id(path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        stem.rsplit('-').next().unwrap_or_default().to_string()
    }

    /// Scan the top level of `logdir`
    pub fn execute(&self, logdir: &Path) -> Result<LogCheckReport, DomainError> {
        if !logdir.is_dir() {
            return Err(DomainError::NotFound(logdir.to_path_buf()));
        }

        let mut logs: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(logdir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| DomainError::FsFail(e.to_string()))?;
            let path = entry.path();
            let matches = path
                .extension()
                .map(|ext| ext.to_string_lossy() == self.extension)
                .unwrap_or(false);
            if entry.file_type().is_file() && matches {
                logs.push(path.to_path_buf());
            }
        }

        let mut report = LogCheckReport::default();
        for path in logs {
            let bytes = std::fs::read(&path)?;
            report.parsed += 1;
            if String::from_utf8_lossy(&bytes).contains(&self.token) {
                continue;
            }
            let id = Self::job_id(&path);
            warn!(log = %path.display(), id = %id, "Run did not complete");
            report.failed_ids.push(id);
        }
        report.failed_ids.sort();

        debug!(parsed = report.parsed, failed = report.failed_ids.len(), "Logs checked");
        Ok(report)
    }
}
