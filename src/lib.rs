//! okvideo batch video toolkit library
//!
//! Manifest-driven batch processing of video files through ffmpeg, ffprobe
//! and youtube-dl: frame extraction, metadata probing, filter-driven edits
//! and downloading with trimming. Each tool fans the rows of a manifest out
//! to a bounded worker pool and writes one report record per row.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::batch::{BatchRunner, BatchTask, CancelHandle};
pub use domain::errors::DomainError;
pub use domain::model::{ManifestRow, Report, StatusRecord, VideoStats};
pub use error::{OkvideoError, OkvideoResult, RunStatus};
