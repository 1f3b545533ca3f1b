//! okvideo CLI
//!
//! Batch video processing driven by manifest files.
//!
//! # Usage
//!
//! ```bash
//! okvideo dump-frames -i videos.csv -o frames --root /data/videos -n 8
//! okvideo video-info -i videos.csv -o stats.csv --root /data/videos
//! okvideo edit -i videos.csv -o small --filters "-vf scale=320x240"
//! okvideo crawl -i kinetics.csv -o clips --tmp-dir /scratch
//! okvideo frame-list -i videos.txt -o frames.txt -d /data/frames
//! okvideo check-logs -l logs/
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use okvideo_cli::app::container::AppContainer;
use okvideo_cli::cli::commands::{self, CommandContext};
use okvideo_cli::cli::Cli;
use okvideo_cli::config_initialization::initialize_configuration;
use okvideo_cli::error::OkvideoError;

/// Main entry point for the okvideo CLI
#[tokio::main]
async fn main() -> ExitCode {
    // Argument errors exit with code 2 from inside clap
    let cli = Cli::parse();

    let runtime = match initialize_configuration(&cli) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("okvideo: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };
    runtime.logging.init();
    info!("Starting okvideo {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &runtime.config_path {
        info!("Loaded configuration from: {}", path.display());
    }

    let container = AppContainer::new(&runtime.settings);
    let ctx = CommandContext::new(container, runtime.settings);

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing running items");
            cancel.cancel();
        }
    });

    match commands::execute(cli.command, &ctx).await {
        Ok(status) => status.exit_code(),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(OkvideoError::exit_code_for(&e))
        }
    }
}
