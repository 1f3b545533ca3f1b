//! Command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use crate::adapters::toml_config::Settings;
use crate::app::batch::{BatchRunner, BatchTask, CancelHandle, HeaderMode, ManifestReader, ReportWriter};
use crate::app::container::AppContainer;
use crate::app::crawl_interactor::CrawlOptions;
use crate::app::dump_frames_interactor::DumpFramesOptions;
use crate::app::edit_interactor::EditOptions;
use crate::app::frame_list_interactor::FrameListInteractor;
use crate::app::log_check_interactor::LogCheckInteractor;
use crate::cli::args::*;
use crate::cli::Commands;
use crate::config_initialization::{resolve_jobs, resolve_tmp_dir};
use crate::error::{OkvideoError, RunStatus};
use crate::utils::logging::SUCCESS_TOKEN;
use crate::utils::path::PathUtils;

/// Default report name for dump-frames and edit
pub const DEFAULT_SUMMARY: &str = "report.csv";
/// Default report name for crawl
pub const DEFAULT_CRAWL_SUMMARY: &str = "download_report.json";

/// Everything a command needs besides its arguments
pub struct CommandContext {
    pub container: AppContainer,
    pub settings: Settings,
    pub cancel: CancelHandle,
}

impl CommandContext {
    pub fn new(container: AppContainer, settings: Settings) -> Self {
        Self {
            container,
            settings,
            cancel: CancelHandle::new(),
        }
    }
}

/// Execute one parsed command
pub async fn execute(command: Commands, ctx: &CommandContext) -> Result<RunStatus> {
    match command {
        Commands::DumpFrames(args) => dump_frames(args, ctx).await,
        Commands::VideoInfo(args) => video_info(args, ctx).await,
        Commands::Edit(args) => edit(args, ctx).await,
        Commands::Crawl(args) => crawl(args, ctx).await,
        Commands::FrameList(args) => frame_list(args),
        Commands::CheckLogs(args) => check_logs(args),
    }
}

/// Execute the dump-frames command
pub async fn dump_frames(args: DumpFramesArgs, ctx: &CommandContext) -> Result<RunStatus> {
    ensure_dir(&args.output_dir)?;
    let summary = args
        .summary
        .clone()
        .unwrap_or_else(|| args.output_dir.join(DEFAULT_SUMMARY));
    let task = ctx.container.dump_frames_interactor(DumpFramesOptions {
        output_dir: args.output_dir,
        root: args.root,
        frame_format: args.frame_format,
        filters: PathUtils::split_filters(&args.filters),
    });
    run_batch(task, &args.batch, &summary, ctx).await
}

/// Execute the video-info command
pub async fn video_info(args: VideoInfoArgs, ctx: &CommandContext) -> Result<RunStatus> {
    let task = Arc::new(
        ctx.container
            .video_info_interactor(args.root)
            .with_frame_glob(args.frame_glob),
    );
    run_batch(task, &args.batch, &args.output_file, ctx).await
}

/// Execute the edit command
pub async fn edit(args: EditArgs, ctx: &CommandContext) -> Result<RunStatus> {
    ensure_dir(&args.output_dir)?;
    let summary = args
        .summary
        .clone()
        .unwrap_or_else(|| args.output_dir.join(DEFAULT_SUMMARY));
    let task = ctx.container.edit_interactor(EditOptions {
        output_dir: args.output_dir,
        root: args.root,
        filters: PathUtils::split_filters(&args.filters),
    });
    run_batch(task, &args.batch, &summary, ctx).await
}

/// Execute the crawl command
pub async fn crawl(args: CrawlArgs, ctx: &CommandContext) -> Result<RunStatus> {
    if !args.trim_format.contains("{}") {
        return Err(OkvideoError::config(format!(
            "--trim-format must contain a {{}} placeholder: {:?}",
            args.trim_format
        ))
        .into());
    }
    ensure_dir(&args.output_dir)?;
    let tmp_dir = resolve_tmp_dir(&ctx.settings);
    ensure_dir(&tmp_dir)?;

    let summary = args
        .summary
        .clone()
        .unwrap_or_else(|| args.output_dir.join(DEFAULT_CRAWL_SUMMARY));
    let task = ctx.container.crawl_interactor(CrawlOptions {
        output_dir: args.output_dir,
        trim_format: args.trim_format,
        tmp_dir,
        policy: args.clip_policy,
    });
    run_batch(task, &args.batch, &summary, ctx).await
}

/// Execute the frame-list command
pub fn frame_list(args: FrameListArgs) -> Result<RunStatus> {
    let count = FrameListInteractor::new(&args.dirname)
        .execute(&args.source_list, &args.output_list)
        .with_context(|| format!("Failed to map {}", args.source_list.display()))?;
    info!(entries = count, "{}", SUCCESS_TOKEN);
    Ok(RunStatus::Clean)
}

/// Execute the check-logs command
pub fn check_logs(args: CheckLogsArgs) -> Result<RunStatus> {
    let report = LogCheckInteractor::new(&args.ext, args.token)
        .execute(&args.logdir)
        .with_context(|| format!("Failed to scan {}", args.logdir.display()))?;

    println!("Number of files parsed: {}", report.parsed);
    println!("Number of incomplete runs: {}", report.failed_ids.len());
    if !report.is_clean() {
        println!("{}", report.failed_ids.join(","));
    }

    Ok(if report.is_clean() {
        RunStatus::Clean
    } else {
        RunStatus::Partial
    })
}

/// Load the manifest, run `task` over it and write the report
async fn run_batch<T: BatchTask>(
    task: Arc<T>,
    batch: &BatchArgs,
    summary: &Path,
    ctx: &CommandContext,
) -> Result<RunStatus> {
    let header = if batch.has_header {
        HeaderMode::Present
    } else {
        HeaderMode::Auto
    };
    let rows = ManifestReader::new(header)
        .load(&batch.input_file)
        .with_context(|| format!("Failed to load manifest {}", batch.input_file.display()))?;

    let span = info_span!(
        "batch",
        task = task.name(),
        manifest = %batch.input_file.display()
    );
    let runner = BatchRunner::new(resolve_jobs(&ctx.settings))
        .with_span(span.clone())
        .with_cancel(ctx.cancel.clone());
    let report = runner.run(task, rows).await;

    ReportWriter::write(summary, &report.records)
        .with_context(|| format!("Failed to write report {}", summary.display()))?;
    info!(
        parent: &span,
        report = %summary.display(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "{}",
        SUCCESS_TOKEN
    );

    Ok(if report.is_clean() {
        RunStatus::Clean
    } else {
        RunStatus::Partial
    })
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| OkvideoError::io(format!("Failed to create {}: {}", dir.display(), e)))?;
    Ok(())
}
