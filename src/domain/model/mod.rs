// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One line of a batch manifest
///
/// Rows are immutable once read. `index` is the zero-based position of the
/// row among the data rows of the manifest and is what the orchestrator uses
/// to put results back in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub index: usize,
    /// Video path (relative to a root, or absolute) or remote video identifier
    pub identifier: String,
    /// Start of the requested window in seconds
    pub start: Option<f64>,
    /// End of the requested window in seconds
    pub end: Option<f64>,
    pub label: Option<String>,
}

impl ManifestRow {
    /// Create a row carrying only an identifier
    pub fn new(index: usize, identifier: impl Into<String>) -> Self {
        Self {
            index,
            identifier: identifier.into(),
            start: None,
            end: None,
            label: None,
        }
    }

    /// Attach time bounds to the row
    pub fn with_bounds(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Attach a label to the row
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// What to do with a downloaded clip before it lands in the output directory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipOperation {
    /// Move the artifact verbatim
    NoTrim,
    /// Re-encode at the normalized resolution without cutting
    Normalize,
    /// Keep only `[start, end)` seconds
    TrimWindow { start: f64, end: f64 },
}

impl ClipOperation {
    /// Length of the kept window in seconds, if any
    pub fn window_duration(&self) -> Option<f64> {
        match self {
            ClipOperation::TrimWindow { start, end } => Some(end - start),
            _ => None,
        }
    }
}

impl fmt::Display for ClipOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipOperation::NoTrim => write!(f, "no-trim"),
            ClipOperation::Normalize => write!(f, "normalize"),
            ClipOperation::TrimWindow { start, end } => write!(f, "trim[{}, {})", start, end),
        }
    }
}

/// Stream field requested from the probing tool
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeField {
    Duration,
    FrameRate,
    Resolution,
    /// Frame count; `pattern` selects the files counted when the path is a
    /// directory of extracted frames
    FrameCount { pattern: String },
}

impl ProbeField {
    /// Frame count with the default frame glob
    pub fn frame_count() -> Self {
        ProbeField::FrameCount {
            pattern: DEFAULT_FRAME_GLOB.to_string(),
        }
    }
}

/// Default glob used to count extracted frames
pub const DEFAULT_FRAME_GLOB: &str = "*.jpg";

/// Value produced by a successful probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeValue {
    Duration(f64),
    FrameRate(f64),
    Resolution { width: u32, height: u32 },
    FrameCount(u64),
}

/// Result of one transform invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub success: bool,
    /// Whether the invocation was skipped because the output already existed
    pub skipped: bool,
    pub message: String,
}

impl TransformOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: false,
            message: message.into(),
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: true,
            skipped: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            skipped: false,
            message: message.into(),
        }
    }
}

/// Result of a remote download
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Path of the downloaded artifact
    Downloaded(PathBuf),
    /// Error text captured from the last failed attempt
    Failed(String),
}

/// Common view over every per-item record kind
pub trait Outcome {
    /// Report column names, in serialization order
    const COLUMNS: &'static [&'static str];

    /// Identifier of the manifest row this record belongs to
    fn identifier(&self) -> &str;

    /// Whether the item completed successfully
    fn succeeded(&self) -> bool;
}

/// Generic `(identifier, success, message)` status record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub identifier: String,
    pub success: bool,
    pub message: String,
}

impl StatusRecord {
    pub fn success(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            success: false,
            message: message.into(),
        }
    }
}

impl Outcome for StatusRecord {
    const COLUMNS: &'static [&'static str] = &["identifier", "success", "message"];

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn succeeded(&self) -> bool {
        self.success
    }
}

/// Metadata collected for one video
///
/// `None` marks a value the probing tool could not provide; it is written as
/// an empty field and is never confused with a genuine zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub video_name: String,
    pub duration: Option<f64>,
    pub frame_rate: Option<f64>,
    pub num_frames: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `ok`, or the reason the row could not be probed
    pub status: String,
}

/// Status value of a fully probed row
pub const STATS_OK: &str = "ok";

impl VideoStats {
    /// Record for a video that could not be probed at all
    pub fn unavailable(video_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            video_name: video_name.into(),
            duration: None,
            frame_rate: None,
            num_frames: None,
            width: None,
            height: None,
            status: reason.into(),
        }
    }
}

impl Outcome for VideoStats {
    const COLUMNS: &'static [&'static str] = &[
        "video_name",
        "duration",
        "frame_rate",
        "num_frames",
        "width",
        "height",
        "status",
    ];

    fn identifier(&self) -> &str {
        &self.video_name
    }

    fn succeeded(&self) -> bool {
        self.status == STATS_OK
    }
}

/// Ordered per-row records of one batch run
#[derive(Debug, Clone)]
pub struct Report<T> {
    pub records: Vec<T>,
    /// Whether the run was interrupted before every row was dispatched
    pub cancelled: bool,
}

impl<T: Outcome> Report<T> {
    /// Number of rows that completed successfully
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.succeeded()).count()
    }

    /// Number of rows that failed
    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    /// Whether every row succeeded and the run was not cancelled
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.failed() == 0
    }
}
