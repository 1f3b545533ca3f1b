//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::app::crawl_interactor::DEFAULT_TRIM_FORMAT;
use crate::app::dump_frames_interactor::{DEFAULT_DUMP_FILTERS, DEFAULT_FRAME_FORMAT};
use crate::app::edit_interactor::DEFAULT_EDIT_FILTERS;
use crate::app::log_check_interactor::DEFAULT_LOG_EXTENSION;
use crate::domain::model::DEFAULT_FRAME_GLOB;
use crate::domain::rules::ClipPolicy;
use crate::utils::logging::SUCCESS_TOKEN;

/// Largest accepted worker pool
pub const MAX_JOBS: usize = 512;

fn parse_jobs(s: &str) -> Result<usize, String> {
    number_range(s, 1, MAX_JOBS)
}

fn parse_policy(s: &str) -> Result<ClipPolicy, String> {
    ClipPolicy::parse(s).map_err(|e| e.to_string())
}

/// Options shared by every manifest-driven command
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Manifest: one row per item, comma or tab separated
    #[arg(short, long)]
    pub input_file: PathBuf,

    /// Number of parallel workers [default: number of CPUs]
    #[arg(short = 'n', long, value_parser = parse_jobs, env = "OKVIDEO_JOBS")]
    pub jobs: Option<usize>,

    /// Always treat the first manifest line as a header
    #[arg(long)]
    pub has_header: bool,
}

/// Arguments for the dump-frames command
#[derive(Args, Debug)]
pub struct DumpFramesArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Directory receiving one frame directory per video
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Report file [default: <output-dir>/report.csv]
    #[arg(short, long)]
    pub summary: Option<PathBuf>,

    /// printf-style frame file name
    #[arg(short, long, default_value = DEFAULT_FRAME_FORMAT)]
    pub frame_format: String,

    /// ffmpeg filter arguments
    #[arg(long, default_value = DEFAULT_DUMP_FILTERS, allow_hyphen_values = true)]
    pub filters: String,

    /// Directory manifest paths are relative to
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Arguments for the video-info command
#[derive(Args, Debug)]
pub struct VideoInfoArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Metadata report file
    #[arg(short, long)]
    pub output_file: PathBuf,

    /// Directory manifest paths are relative to
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Files counted when a manifest entry is a directory of frames
    #[arg(long, default_value = DEFAULT_FRAME_GLOB)]
    pub frame_glob: String,
}

/// Arguments for the edit command
#[derive(Args, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Directory receiving the edited videos
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Report file [default: <output-dir>/report.csv]
    #[arg(short, long)]
    pub summary: Option<PathBuf>,

    /// ffmpeg filter arguments
    #[arg(long, default_value = DEFAULT_EDIT_FILTERS, allow_hyphen_values = true)]
    pub filters: String,

    /// Directory manifest paths are relative to
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Arguments for the crawl command
#[derive(Args, Debug)]
pub struct CrawlArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Directory receiving the clips
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Report file [default: <output-dir>/download_report.json]
    #[arg(short, long)]
    pub summary: Option<PathBuf>,

    /// Clip file name template; `{}` is replaced by the video identifier
    #[arg(long, default_value = DEFAULT_TRIM_FORMAT)]
    pub trim_format: String,

    /// Root for per-clip scratch directories
    #[arg(short, long, env = "OKVIDEO_TMP_DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// How time bounds are applied (window, normalize, keep, legacy)
    #[arg(long, default_value = "window", value_parser = parse_policy)]
    pub clip_policy: ClipPolicy,

    /// Download attempts per clip
    #[arg(long)]
    pub attempts: Option<u32>,
}

/// Arguments for the frame-list command
#[derive(Args, Debug)]
pub struct FrameListArgs {
    /// File listing one video path per line
    #[arg(short = 'i', long)]
    pub source_list: PathBuf,

    /// File receiving one frame directory per line
    #[arg(short = 'o', long)]
    pub output_list: PathBuf,

    /// Directory the frame directories live under
    #[arg(short, long)]
    pub dirname: PathBuf,
}

/// Arguments for the check-logs command
#[derive(Args, Debug)]
pub struct CheckLogsArgs {
    /// Directory holding one log file per run
    #[arg(short, long)]
    pub logdir: PathBuf,

    /// Extension of the log files
    #[arg(short, long, default_value = DEFAULT_LOG_EXTENSION)]
    pub ext: String,

    /// Text every completed run writes to its log
    #[arg(short, long, default_value = SUCCESS_TOKEN)]
    pub token: String,
}
