// Video-info interactor - Collects stream metadata per manifest video

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::app::batch::BatchTask;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Interactor for the video-info batch
pub struct VideoInfoInteractor {
    probe_port: Arc<dyn ProbePort>,
    root: Option<PathBuf>,
    frame_glob: String,
}

impl VideoInfoInteractor {
    /// Create new video-info interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>, root: Option<PathBuf>) -> Self {
        Self {
            probe_port,
            root,
            frame_glob: DEFAULT_FRAME_GLOB.to_string(),
        }
    }

    /// Glob used when an identifier names a directory of extracted frames
    pub fn with_frame_glob(mut self, pattern: impl Into<String>) -> Self {
        self.frame_glob = pattern.into();
        self
    }

    async fn probe(&self, path: &Path, field: ProbeField) -> Option<ProbeValue> {
        match self.probe_port.probe(path, &field).await {
            Ok(value) => value,
            Err(DomainError::NotFound(_)) => None,
            Err(e) => {
                warn!(path = %path.display(), ?field, "Probe failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl BatchTask for VideoInfoInteractor {
    type Record = VideoStats;

    fn name(&self) -> &'static str {
        "video-info"
    }

    async fn process(&self, row: &ManifestRow) -> VideoStats {
        let video_name = PathUtils::basename(&row.identifier);
        let path = PathUtils::resolve_input(self.root.as_deref(), &row.identifier);
        if !path.exists() {
            return VideoStats::unavailable(video_name, "Unexistent file");
        }

        let duration = match self.probe(&path, ProbeField::Duration).await {
            Some(ProbeValue::Duration(d)) => Some(d),
            _ => None,
        };
        let frame_rate = match self.probe(&path, ProbeField::FrameRate).await {
            Some(ProbeValue::FrameRate(r)) => Some(r),
            _ => None,
        };
        let (width, height) = match self.probe(&path, ProbeField::Resolution).await {
            Some(ProbeValue::Resolution { width, height }) => (Some(width), Some(height)),
            _ => (None, None),
        };
        let frame_field = ProbeField::FrameCount {
            pattern: self.frame_glob.clone(),
        };
        let num_frames = match self.probe(&path, frame_field).await {
            Some(ProbeValue::FrameCount(n)) => Some(n),
            _ => None,
        };

        let mut missing = Vec::new();
        if duration.is_none() {
            missing.push("duration");
        }
        if frame_rate.is_none() {
            missing.push("frame_rate");
        }
        if num_frames.is_none() {
            missing.push("num_frames");
        }
        if width.is_none() {
            missing.push("resolution");
        }
        let status = if missing.is_empty() {
            STATS_OK.to_string()
        } else {
            format!("unavailable: {}", missing.join(" "))
        };

        VideoStats {
            video_name,
            duration,
            frame_rate,
            num_frames,
            width,
            height,
            status,
        }
    }

    fn failure(&self, row: &ManifestRow, reason: &str) -> VideoStats {
        VideoStats::unavailable(PathUtils::basename(&row.identifier), reason)
    }
}
