//! Manifest loading
//!
//! Manifests are flat delimited files without a required header: the first
//! column holds a video path or identifier, optional further columns hold the
//! start time, end time and label of the row. A header naming its columns
//! (`label,youtube_id,time_start,time_end,split`) is read by name instead.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;

/// How the first line of a manifest is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Skip the first line when its time columns are not numeric
    #[default]
    Auto,
    /// Always skip the first line
    Present,
    /// Never skip the first line
    Absent,
}

/// Header names of the identifier column
const IDENTIFIER_HEADERS: [&str; 8] = [
    "youtube_id",
    "youtube-id",
    "video_id",
    "video",
    "video_name",
    "filename",
    "path",
    "identifier",
];
const START_HEADERS: [&str; 3] = ["time_start", "start", "start_time"];
const END_HEADERS: [&str; 3] = ["time_end", "end", "end_time"];
const LABEL_HEADERS: [&str; 2] = ["label", "class"];

/// Position of each manifest field within a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    identifier: usize,
    start: Option<usize>,
    end: Option<usize>,
    label: Option<usize>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            identifier: 0,
            start: Some(1),
            end: Some(2),
            label: Some(3),
        }
    }
}

impl ColumnMap {
    /// Map columns by the names in a header record
    ///
    /// Returns `None` when no column names the identifier, in which case the
    /// positional layout applies.
    fn from_header(header: &StringRecord) -> Option<Self> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|h| names.contains(&h.to_lowercase().as_str()))
        };
        Some(Self {
            identifier: find(&IDENTIFIER_HEADERS)?,
            start: find(&START_HEADERS),
            end: find(&END_HEADERS),
            label: find(&LABEL_HEADERS),
        })
    }
}

/// Manifest reader
#[derive(Debug, Clone, Default)]
pub struct ManifestReader {
    header: HeaderMode,
}

impl ManifestReader {
    /// Create a reader with the given header handling
    pub fn new(header: HeaderMode) -> Self {
        Self { header }
    }

    /// Load the manifest at `path`
    pub fn load(&self, path: &Path) -> Result<Vec<ManifestRow>, DomainError> {
        if !path.is_file() {
            return Err(DomainError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Manifest(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let tsv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        let delimiter = if tsv { b'\t' } else { detect_delimiter(&content) };
        let rows = self.parse(&content, delimiter)?;
        debug!(path = %path.display(), rows = rows.len(), "Manifest loaded");
        Ok(rows)
    }

    /// Parse manifest text with an explicit delimiter
    pub fn parse(&self, content: &str, delimiter: u8) -> Result<Vec<ManifestRow>, DomainError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut columns = ColumnMap::default();
        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| DomainError::Manifest(e.to_string()))?;
            if line == 0 && self.skips_first(&record) {
                if let Some(named) = ColumnMap::from_header(&record) {
                    debug!(columns = ?named, "Manifest columns mapped by header");
                    columns = named;
                }
                continue;
            }
            if record.iter().all(str::is_empty) {
                continue;
            }

            let identifier = record.get(columns.identifier).unwrap_or_default();
            let start = parse_time(&record, columns.start, line)?;
            let end = parse_time(&record, columns.end, line)?;
            let mut row = ManifestRow::new(rows.len(), identifier).with_bounds(start, end);
            if let Some(label) = columns
                .label
                .and_then(|col| record.get(col))
                .filter(|l| !l.is_empty())
            {
                row = row.with_label(label);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn skips_first(&self, record: &StringRecord) -> bool {
        match self.header {
            HeaderMode::Present => true,
            HeaderMode::Absent => false,
            HeaderMode::Auto => looks_like_header(record),
        }
    }
}

/// Tab when the first non-empty line contains one, comma otherwise
fn detect_delimiter(content: &str) -> u8 {
    let first = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

fn looks_like_header(record: &StringRecord) -> bool {
    if record
        .iter()
        .any(|field| IDENTIFIER_HEADERS.contains(&field.to_lowercase().as_str()))
    {
        return true;
    }
    [1, 2].iter().any(|&col| {
        record
            .get(col)
            .filter(|v| !v.is_empty())
            .map(|v| v.parse::<f64>().is_err())
            .unwrap_or(false)
    })
}

fn parse_time(
    record: &StringRecord,
    col: Option<usize>,
    line: usize,
) -> Result<Option<f64>, DomainError> {
    let Some(col) = col else {
        return Ok(None);
    };
    match record.get(col).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse::<f64>().map(Some).map_err(|_| {
            DomainError::Manifest(format!(
                "line {}: column {} is not a number of seconds: {:?}",
                line + 1,
                col + 1,
                value
            ))
        }),
    }
}
