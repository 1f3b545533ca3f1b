//! FFprobe adapter for media file probing
//!
//! Each probe asks ffprobe for a single field of the first video stream and
//! parses its wrapper-free text output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::ProbeOutputParser;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    runner: Arc<dyn ProcessPort>,
    binary: String,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(runner: Arc<dyn ProcessPort>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Build the ffprobe argument vector for one field
    pub fn invocation(&self, path: &Path, field: &ProbeField) -> Invocation {
        let base = Invocation::new(&self.binary);
        let invocation = match field {
            ProbeField::Duration => base.args(["-v", "0"]).args(single_entry("stream=duration")),
            ProbeField::FrameRate => base
                .args(["-v", "0"])
                .args(single_entry("stream=avg_frame_rate")),
            ProbeField::Resolution => base.args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=height,width",
                "-of",
                "default=noprint_wrappers=1",
            ]),
            ProbeField::FrameCount { .. } => base
                .args(["-v", "error", "-count_frames"])
                .args(single_entry("stream=nb_read_frames")),
        };
        invocation.arg(path)
    }

    /// Parse tool output into a value for the requested field
    fn parse(field: &ProbeField, output: &str) -> Option<ProbeValue> {
        match field {
            ProbeField::Duration => ProbeOutputParser::duration(output).map(ProbeValue::Duration),
            ProbeField::FrameRate => {
                ProbeOutputParser::frame_rate(output).map(ProbeValue::FrameRate)
            }
            ProbeField::Resolution => ProbeOutputParser::resolution(output)
                .map(|(width, height)| ProbeValue::Resolution { width, height }),
            ProbeField::FrameCount { .. } => {
                ProbeOutputParser::frame_count(output).map(ProbeValue::FrameCount)
            }
        }
    }
}

/// Arguments selecting one bare value of the first video stream
fn single_entry(entry: &str) -> [&str; 6] {
    [
        "-select_streams",
        "v:0",
        "-show_entries",
        entry,
        "-of",
        "default=nokey=1:noprint_wrappers=1",
    ]
}

/// Count files in `dir` matching `pattern`
///
/// A directory of previously extracted frames stands in for the video it
/// was extracted from.
pub fn count_frames_in_dir(dir: &Path, pattern: &str) -> Result<u64, DomainError> {
    let full = PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy())).join(pattern);
    let entries = glob::glob(&full.to_string_lossy())
        .map_err(|e| DomainError::Config(format!("Invalid frame pattern {}: {}", pattern, e)))?;
    let count = entries
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .count();
    Ok(count as u64)
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(
        &self,
        path: &Path,
        field: &ProbeField,
    ) -> Result<Option<ProbeValue>, DomainError> {
        if let ProbeField::FrameCount { pattern } = field {
            if path.is_dir() {
                return count_frames_in_dir(path, pattern).map(|n| Some(ProbeValue::FrameCount(n)));
            }
        }
        if !path.is_file() {
            return Err(DomainError::NotFound(path.to_path_buf()));
        }

        let invocation = self.invocation(path, field);
        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(e) => {
                warn!(path = %path.display(), ?field, "Probe could not run: {}", e);
                return Ok(None);
            }
        };
        if !output.success() {
            warn!(
                path = %path.display(),
                ?field,
                code = ?output.code,
                "Probe exited with failure"
            );
            return Ok(None);
        }

        let value = Self::parse(field, &output.stdout);
        if value.is_none() {
            debug!(path = %path.display(), ?field, output = %output.stdout.trim(), "Probe value unavailable");
        }
        Ok(value)
    }
}
