//! Configuration initialization and hierarchy management
//!
//! Precedence is CLI > environment > settings file > built-in defaults. The
//! environment layer is handled by clap, which folds `OKVIDEO_*` variables
//! into the parsed [`Cli`].

use std::path::PathBuf;

use crate::adapters::toml_config::{Settings, TomlConfigAdapter};
use crate::cli::args::MAX_JOBS;
use crate::cli::{Cli, Commands};
use crate::error::{OkvideoError, OkvideoResult};
use crate::utils::logging::LoggingConfig;

/// Fully resolved configuration of one invocation
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub settings: Settings,
    pub logging: LoggingConfig,
    /// Settings file the values were read from
    pub config_path: Option<PathBuf>,
}

/// Load the settings file and apply CLI/env overrides on top
///
/// Runs before the subscriber exists, so nothing here logs.
pub fn initialize_configuration(cli: &Cli) -> OkvideoResult<RuntimeConfig> {
    let config_path = TomlConfigAdapter::locate(cli.config.as_deref())
        .map_err(|e| OkvideoError::config(e.to_string()))?;
    let mut settings = TomlConfigAdapter::load(config_path.as_deref())
        .map_err(|e| OkvideoError::config(e.to_string()))?;
    apply_cli_overrides(&mut settings, cli);
    validate(&settings)?;

    let mut logging =
        LoggingConfig::from_strings(&settings.logging.level, &settings.logging.format)?;
    logging.target = settings.logging.target;
    Ok(RuntimeConfig {
        settings,
        logging,
        config_path,
    })
}

/// Apply the global and command-specific CLI values that live in [`Settings`]
pub fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        settings.logging.format = format.clone();
    }
    if cli.log_target {
        settings.logging.target = true;
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        settings.tools.ffmpeg = ffmpeg.clone();
    }
    if let Some(ffprobe) = &cli.ffprobe {
        settings.tools.ffprobe = ffprobe.clone();
    }
    if let Some(youtube_dl) = &cli.youtube_dl {
        settings.tools.youtube_dl = youtube_dl.clone();
    }

    let batch = match &cli.command {
        Commands::DumpFrames(args) => Some(&args.batch),
        Commands::VideoInfo(args) => Some(&args.batch),
        Commands::Edit(args) => Some(&args.batch),
        Commands::Crawl(args) => Some(&args.batch),
        Commands::FrameList(_) | Commands::CheckLogs(_) => None,
    };
    if let Some(jobs) = batch.and_then(|b| b.jobs) {
        settings.batch.jobs = Some(jobs);
    }

    if let Commands::Crawl(args) = &cli.command {
        if let Some(tmp_dir) = &args.tmp_dir {
            settings.batch.tmp_dir = Some(tmp_dir.clone());
        }
        if let Some(attempts) = args.attempts {
            settings.fetch.attempts = attempts;
        }
    }
}

fn validate(settings: &Settings) -> OkvideoResult<()> {
    if let Some(jobs) = settings.batch.jobs {
        if jobs == 0 || jobs > MAX_JOBS {
            return Err(OkvideoError::config(format!(
                "batch.jobs must be between 1 and {}, got {}",
                MAX_JOBS, jobs
            )));
        }
    }
    if settings.fetch.attempts == 0 {
        return Err(OkvideoError::config("fetch.attempts must be at least 1"));
    }
    Ok(())
}

/// Worker pool size: configured value, else the number of CPUs
pub fn resolve_jobs(settings: &Settings) -> usize {
    settings
        .batch
        .jobs
        .unwrap_or_else(num_cpus::get)
        .clamp(1, MAX_JOBS)
}

/// Root for per-item scratch directories
pub fn resolve_tmp_dir(settings: &Settings) -> PathBuf {
    settings
        .batch
        .tmp_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("okvideo"))
}
