//! Report writer
//!
//! Records are written in manifest order to a temporary file next to the
//! destination and renamed into place once complete, so an interrupted run
//! never leaves a truncated report behind.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Report serialization, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Tsv,
    Json,
    Yaml,
}

impl ReportFormat {
    /// Format for `path`; anything unrecognised is written as CSV
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "tsv" => ReportFormat::Tsv,
            "json" => ReportFormat::Json,
            "yaml" | "yml" => ReportFormat::Yaml,
            _ => ReportFormat::Csv,
        }
    }
}

/// Report file writer
pub struct ReportWriter;

impl ReportWriter {
    /// Write `records` to `path`, creating its parent directory if needed
    pub fn write<T>(path: &Path, records: &[T]) -> Result<(), DomainError>
    where
        T: Outcome + Serialize,
    {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| {
            DomainError::Report(format!("Failed to create {}: {}", parent.display(), e))
        })?;

        let temp = NamedTempFile::new_in(parent).map_err(|e| {
            DomainError::Report(format!("Failed to create temporary report: {}", e))
        })?;
        let format = ReportFormat::from_path(path);
        {
            let mut out = BufWriter::new(temp.as_file());
            Self::serialize(&mut out, format, records)?;
            out.flush().map_err(report_error)?;
        }
        temp.persist(path).map_err(|e| {
            DomainError::Report(format!("Failed to write {}: {}", path.display(), e.error))
        })?;

        info!(path = %path.display(), rows = records.len(), "Report written");
        Ok(())
    }

    fn serialize<W, T>(out: W, format: ReportFormat, records: &[T]) -> Result<(), DomainError>
    where
        W: Write,
        T: Outcome + Serialize,
    {
        match format {
            ReportFormat::Csv | ReportFormat::Tsv => {
                let delimiter = if format == ReportFormat::Tsv { b'\t' } else { b',' };
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .delimiter(delimiter)
                    .from_writer(out);
                writer.write_record(T::COLUMNS).map_err(report_error)?;
                for record in records {
                    writer.serialize(record).map_err(report_error)?;
                }
                writer.flush().map_err(report_error)
            }
            ReportFormat::Json => serde_json::to_writer_pretty(out, records).map_err(report_error),
            ReportFormat::Yaml => serde_yaml::to_writer(out, records).map_err(report_error),
        }
    }
}

fn report_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::Report(e.to_string())
}
