//! CLI module for okvideo
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::*;

/// okvideo batch video toolkit
///
/// Runs ffmpeg, ffprobe and youtube-dl over the rows of a manifest with a
/// bounded worker pool and writes one report line per row.
#[derive(Parser, Debug)]
#[command(name = "okvideo")]
#[command(about = "Manifest-driven batch video processing on top of ffmpeg")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "OKVIDEO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true, env = "OKVIDEO_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Print the emitting module next to each log event
    #[arg(long, global = true, env = "OKVIDEO_LOG_TARGET")]
    pub log_target: bool,

    /// Settings file; ./okvideo.toml and ./config/okvideo.toml are tried otherwise
    #[arg(long, global = true, env = "OKVIDEO_CONFIG")]
    pub config: Option<PathBuf>,

    /// ffmpeg binary
    #[arg(long, global = true, env = "OKVIDEO_FFMPEG")]
    pub ffmpeg: Option<String>,

    /// ffprobe binary
    #[arg(long, global = true, env = "OKVIDEO_FFPROBE")]
    pub ffprobe: Option<String>,

    /// youtube-dl binary
    #[arg(long, global = true, env = "OKVIDEO_YOUTUBE_DL")]
    pub youtube_dl: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract an image sequence from every video of a manifest
    DumpFrames(DumpFramesArgs),
    /// Probe duration, frame rate, frame count and resolution of every video
    VideoInfo(VideoInfoArgs),
    /// Re-encode every video of a manifest with ffmpeg filters
    Edit(EditArgs),
    /// Download and trim every clip of a manifest
    Crawl(CrawlArgs),
    /// Map a list of video files to their frame directories
    FrameList(FrameListArgs),
    /// Find batch logs that never reached the success token
    CheckLogs(CheckLogsArgs),
}
