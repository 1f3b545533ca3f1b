// Dump-frames interactor - Extracts an image sequence per manifest video

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::app::batch::BatchTask;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Default printf-style frame name
pub const DEFAULT_FRAME_FORMAT: &str = "%06d.jpg";
/// Default extraction filters
pub const DEFAULT_DUMP_FILTERS: &str = "-vf fps=5,scale=320:240";

/// Options shared by every row of a dump-frames run
#[derive(Debug, Clone)]
pub struct DumpFramesOptions {
    pub output_dir: PathBuf,
    pub root: Option<PathBuf>,
    pub frame_format: String,
    pub filters: Vec<String>,
}

/// Interactor for the dump-frames batch
pub struct DumpFramesInteractor {
    transform_port: Arc<dyn TransformPort>,
    probe_port: Arc<dyn ProbePort>,
    options: DumpFramesOptions,
}

impl DumpFramesInteractor {
    /// Create new dump-frames interactor with injected ports
    pub fn new(
        transform_port: Arc<dyn TransformPort>,
        probe_port: Arc<dyn ProbePort>,
        options: DumpFramesOptions,
    ) -> Self {
        Self {
            transform_port,
            probe_port,
            options,
        }
    }

    /// Number of frames in `frame_dir`, or the fallback message when it
    /// cannot be counted
    async fn frame_count_message(&self, frame_dir: &std::path::Path, fallback: &str) -> String {
        let field = ProbeField::FrameCount {
            pattern: PathUtils::frame_glob(&self.options.frame_format),
        };
        match self.probe_port.probe(frame_dir, &field).await {
            Ok(Some(ProbeValue::FrameCount(n))) => n.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[async_trait]
impl BatchTask for DumpFramesInteractor {
    type Record = StatusRecord;

    fn name(&self) -> &'static str {
        "dump-frames"
    }

    async fn process(&self, row: &ManifestRow) -> StatusRecord {
        let identifier = PathUtils::strip_extension(&row.identifier);
        let input = PathUtils::resolve_input(self.options.root.as_deref(), &row.identifier);
        let frame_dir = self
            .options
            .output_dir
            .join(PathUtils::output_key(self.options.root.as_deref(), &row.identifier));

        let first_frame = frame_dir.join(PathUtils::render_frame_name(&self.options.frame_format, 1));
        if first_frame.is_file() {
            debug!(frame_dir = %frame_dir.display(), "Frames already extracted");
            let message = self.frame_count_message(&frame_dir, "Exists").await;
            return StatusRecord::success(identifier, message);
        }
        if !input.is_file() {
            debug!(input = %input.display(), "Input missing");
            return StatusRecord::failure(identifier, "Unexistent file");
        }

        let outcome = self
            .transform_port
            .extract_frames(&FrameDumpRequest {
                input,
                frame_dir: frame_dir.clone(),
                frame_format: self.options.frame_format.clone(),
                filters: self.options.filters.clone(),
            })
            .await;
        if !outcome.success {
            return StatusRecord::failure(identifier, outcome.message);
        }
        let message = self.frame_count_message(&frame_dir, &outcome.message).await;
        StatusRecord::success(identifier, message)
    }

    fn failure(&self, row: &ManifestRow, reason: &str) -> StatusRecord {
        StatusRecord::failure(PathUtils::strip_extension(&row.identifier), reason)
    }
}
