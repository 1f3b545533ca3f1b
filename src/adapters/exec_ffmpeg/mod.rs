//! FFmpeg execution adapter
//!
//! Frame extraction, filter-driven editing and clip placement through the
//! `ffmpeg` binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::model::*;
use crate::domain::rules::last_message_line;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Filters applied when normalizing a clip instead of trimming it
pub const NORMALIZE_FILTERS: [&str; 2] = ["-vf", "scale=320:240"];

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    runner: Arc<dyn ProcessPort>,
    binary: String,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(runner: Arc<dyn ProcessPort>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Argument vector for dumping frames
    pub fn frames_invocation(&self, request: &FrameDumpRequest) -> Invocation {
        Invocation::new(&self.binary)
            .args(["-v", "error", "-i"])
            .arg(&request.input)
            .args(&request.filters)
            .args(["-qscale:v", "2", "-f", "image2"])
            .arg(request.frame_dir.join(&request.frame_format))
    }

    /// Argument vector for editing one file
    pub fn edit_invocation(&self, request: &EditRequest) -> Invocation {
        Invocation::new(&self.binary)
            .arg("-i")
            .arg(&request.input)
            .args(&request.filters)
            .arg(&request.output)
    }

    /// Argument vector for normalizing or trimming a clip
    ///
    /// Returns `None` for [`ClipOperation::NoTrim`], which needs no tool.
    pub fn clip_invocation(&self, request: &ClipRequest) -> Option<Invocation> {
        let filters: Vec<String> = match request.operation {
            ClipOperation::NoTrim => return None,
            ClipOperation::Normalize => NORMALIZE_FILTERS.iter().map(|s| s.to_string()).collect(),
            ClipOperation::TrimWindow { start, end } => vec![
                "-ss".to_string(),
                start.to_string(),
                "-t".to_string(),
                (end - start).to_string(),
            ],
        };
        Some(
            Invocation::new(&self.binary)
                .arg("-i")
                .arg(&request.input)
                .args(filters)
                .args(["-c:v", "libx264", "-c:a", "copy", "-loglevel", "panic"])
                .arg(&request.output),
        )
    }

    /// Run ffmpeg and map its exit status to an outcome
    async fn execute(&self, invocation: &Invocation, success_message: &str) -> TransformOutcome {
        match self.runner.run(invocation).await {
            Ok(output) if output.success() => TransformOutcome::success(success_message),
            Ok(output) => {
                let message = last_message_line(&output.combined());
                debug!(command = %invocation, code = ?output.code, "ffmpeg failed: {}", message);
                TransformOutcome::failure(message)
            }
            Err(e) => TransformOutcome::failure(e.to_string()),
        }
    }
}

/// Create the parent directory of `path` if it is missing
async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

/// Remove what a failed run left at `path`
async fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(output = %path.display(), "Failed to remove partial output: {}", e);
        }
    }
}

/// Remove the frames a failed extraction wrote into `frame_dir`
///
/// Only names of the requested sequence are touched.
async fn remove_partial_frames(frame_dir: &Path, frame_format: &str) {
    let pattern = PathBuf::from(glob::Pattern::escape(&frame_dir.to_string_lossy()))
        .join(PathUtils::frame_glob(frame_format));
    let entries = match glob::glob(&pattern.to_string_lossy()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(frame_dir = %frame_dir.display(), "Invalid frame pattern: {}", e);
            return;
        }
    };
    for frame in entries.filter_map(Result::ok) {
        remove_partial(&frame).await;
    }
}

/// Move a file, falling back to copy-and-delete across file systems
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

#[async_trait]
impl TransformPort for FFmpegAdapter {
    async fn extract_frames(&self, request: &FrameDumpRequest) -> TransformOutcome {
        let first_frame = request
            .frame_dir
            .join(PathUtils::render_frame_name(&request.frame_format, 1));
        if first_frame.is_file() {
            return TransformOutcome::skipped("Exists");
        }
        if let Err(e) = tokio::fs::create_dir_all(&request.frame_dir).await {
            return TransformOutcome::failure(format!(
                "Failed to create {}: {}",
                request.frame_dir.display(),
                e
            ));
        }

        let outcome = self.execute(&self.frames_invocation(request), "success").await;
        if !outcome.success {
            remove_partial_frames(&request.frame_dir, &request.frame_format).await;
        }
        outcome
    }

    async fn edit(&self, request: &EditRequest) -> TransformOutcome {
        if request.output.exists() {
            return TransformOutcome::skipped("Exists");
        }
        if let Err(e) = ensure_parent(&request.output).await {
            return TransformOutcome::failure(format!(
                "Failed to create directory for {}: {}",
                request.output.display(),
                e
            ));
        }

        let outcome = self.execute(&self.edit_invocation(request), "success").await;
        if !outcome.success {
            remove_partial(&request.output).await;
        }
        outcome
    }

    async fn clip(&self, request: &ClipRequest) -> TransformOutcome {
        if let Err(e) = ensure_parent(&request.output).await {
            return TransformOutcome::failure(format!(
                "Failed to create directory for {}: {}",
                request.output.display(),
                e
            ));
        }

        let Some(invocation) = self.clip_invocation(request) else {
            return match move_file(&request.input, &request.output).await {
                Ok(()) => TransformOutcome::success("Downloaded"),
                Err(e) => TransformOutcome::failure(format!(
                    "Failed to move {} into place: {}",
                    request.input.display(),
                    e
                )),
            };
        };

        let outcome = self.execute(&invocation, "Downloaded").await;
        if !outcome.success {
            remove_partial(&request.output).await;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake_process::FakeProcess;
    use crate::domain::errors::DomainError;
    use std::fs;
    use tempfile::TempDir;

    fn dump_request(dir: &TempDir) -> FrameDumpRequest {
        FrameDumpRequest {
            input: dir.path().join("a.mp4"),
            frame_dir: dir.path().join("frames").join("a"),
            frame_format: "%06d.jpg".to_string(),
            filters: PathUtils::split_filters("-vf fps=5,scale=320:240"),
        }
    }

    #[tokio::test]
    async fn test_extract_frames_invocation() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeProcess::replying(0, ""));
        let adapter = FFmpegAdapter::new(fake.clone(), "ffmpeg");
        let request = dump_request(&dir);

        let outcome = adapter.extract_frames(&request).await;
        assert!(outcome.success);
        assert!(!outcome.skipped);
        assert!(request.frame_dir.is_dir());

        let args = fake.calls()[0].args_lossy();
        assert_eq!(&args[..3], &["-v", "error", "-i"]);
        assert_eq!(&args[4..6], &["-vf", "fps=5,scale=320:240"]);
        assert_eq!(&args[6..10], &["-qscale:v", "2", "-f", "image2"]);
        assert!(args[10].ends_with("%06d.jpg"));
    }

    #[tokio::test]
    async fn test_extract_frames_skips_when_first_frame_exists() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeProcess::replying(0, ""));
        let adapter = FFmpegAdapter::new(fake.clone(), "ffmpeg");
        let request = dump_request(&dir);
        fs::create_dir_all(&request.frame_dir).unwrap();
        fs::write(request.frame_dir.join("000001.jpg"), b"jpg").unwrap();

        let outcome = adapter.extract_frames(&request).await;
        assert!(outcome.success);
        assert!(outcome.skipped);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_reports_last_line() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeProcess::new(|_| {
            Ok(ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "line one\nInvalid data found when processing input\n".to_string(),
            })
        }));
        let adapter = FFmpegAdapter::new(fake, "ffmpeg");

        let outcome = adapter.extract_frames(&dump_request(&dir)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid data found when processing input");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_outcome_not_error() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeProcess::new(|inv| {
            Err(DomainError::Spawn {
                program: inv.program.clone(),
                message: "No such file or directory".to_string(),
            })
        }));
        let adapter = FFmpegAdapter::new(fake, "ffmpeg");

        let outcome = adapter.extract_frames(&dump_request(&dir)).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("ffmpeg"));
    }

    #[tokio::test]
    async fn test_edit_skips_existing_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out").join("a.mp4");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, b"done").unwrap();
        let fake = Arc::new(FakeProcess::replying(0, ""));
        let adapter = FFmpegAdapter::new(fake.clone(), "ffmpeg");

        let outcome = adapter
            .edit(&EditRequest {
                input: dir.path().join("a.mp4"),
                output,
                filters: vec![],
            })
            .await;
        assert!(outcome.skipped);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clip_trim_window_arguments() {
        let adapter = FFmpegAdapter::new(Arc::new(FakeProcess::replying(0, "")), "ffmpeg");
        let invocation = adapter
            .clip_invocation(&ClipRequest {
                input: PathBuf::from("tmp.mp4"),
                output: PathBuf::from("out.mp4"),
                operation: ClipOperation::TrimWindow {
                    start: 2.0,
                    end: 12.5,
                },
            })
            .unwrap();
        assert_eq!(
            invocation.args_lossy(),
            vec![
                "-i", "tmp.mp4", "-ss", "2", "-t", "10.5", "-c:v", "libx264", "-c:a", "copy",
                "-loglevel", "panic", "out.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_clip_no_trim_moves_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("download.mp4");
        let output = dir.path().join("clips").join("id.mp4");
        fs::write(&input, b"video").unwrap();
        let fake = Arc::new(FakeProcess::replying(0, ""));
        let adapter = FFmpegAdapter::new(fake.clone(), "ffmpeg");

        let outcome = adapter
            .clip(&ClipRequest {
                input: input.clone(),
                output: output.clone(),
                operation: ClipOperation::NoTrim,
            })
            .await;
        assert!(outcome.success);
        assert!(!input.exists());
        assert_eq!(fs::read(&output).unwrap(), b"video");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_clip_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("id.mp4");
        let partial = output.clone();
        let fake = Arc::new(FakeProcess::new(move |_| {
            fs::write(&partial, b"half").unwrap();
            Ok(ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "Conversion failed!".to_string(),
            })
        }));
        let adapter = FFmpegAdapter::new(fake, "ffmpeg");

        let outcome = adapter
            .clip(&ClipRequest {
                input: dir.path().join("tmp.mp4"),
                output: output.clone(),
                operation: ClipOperation::Normalize,
            })
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Conversion failed!");
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_failed_edit_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out").join("a.mp4");
        let partial = output.clone();
        let fake = Arc::new(FakeProcess::new(move |_| {
            fs::write(&partial, b"half").unwrap();
            Ok(ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "Conversion failed!".to_string(),
            })
        }));
        let adapter = FFmpegAdapter::new(fake.clone(), "ffmpeg");
        let request = EditRequest {
            input: dir.path().join("a.mp4"),
            output: output.clone(),
            filters: vec![],
        };

        let first = adapter.edit(&request).await;
        assert!(!first.success);
        assert!(!output.exists());

        let second = adapter.edit(&request).await;
        assert!(!second.skipped);
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_extraction_removes_written_frames() {
        let dir = TempDir::new().unwrap();
        let request = dump_request(&dir);
        let frame_dir = request.frame_dir.clone();
        let fake = Arc::new(FakeProcess::new(move |_| {
            fs::write(frame_dir.join("000001.jpg"), b"jpg").unwrap();
            fs::write(frame_dir.join("000002.jpg"), b"jpg").unwrap();
            fs::write(frame_dir.join("notes.txt"), b"keep").unwrap();
            Ok(ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "Conversion failed!".to_string(),
            })
        }));
        let adapter = FFmpegAdapter::new(fake.clone(), "ffmpeg");

        let outcome = adapter.extract_frames(&request).await;
        assert!(!outcome.success);
        assert!(!request.frame_dir.join("000001.jpg").exists());
        assert!(!request.frame_dir.join("000002.jpg").exists());
        assert!(request.frame_dir.join("notes.txt").is_file());

        let rerun = adapter.extract_frames(&request).await;
        assert!(!rerun.skipped);
        assert_eq!(fake.calls().len(), 2);
    }
}
