// Crawl interactor - Downloads remote videos and places trimmed clips

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app::batch::BatchTask;
use crate::domain::model::*;
use crate::domain::rules::{ClipPolicy, VideoIdRules};
use crate::ports::*;

/// Default clip file name template
pub const DEFAULT_TRIM_FORMAT: &str = "{}.mp4";

/// Options shared by every row of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub output_dir: PathBuf,
    /// Template with a `{}` placeholder for the identifier
    pub trim_format: String,
    /// Root under which per-row scratch directories are created
    pub tmp_dir: PathBuf,
    pub policy: ClipPolicy,
}

/// Interactor for the crawl batch
pub struct CrawlInteractor {
    fetch_port: Arc<dyn FetchPort>,
    transform_port: Arc<dyn TransformPort>,
    options: CrawlOptions,
}

impl CrawlInteractor {
    /// Create new crawl interactor with injected ports
    pub fn new(
        fetch_port: Arc<dyn FetchPort>,
        transform_port: Arc<dyn TransformPort>,
        options: CrawlOptions,
    ) -> Self {
        Self {
            fetch_port,
            transform_port,
            options,
        }
    }

    /// Final location of the clip for `identifier`
    pub fn clip_path(&self, identifier: &str) -> PathBuf {
        self.options
            .output_dir
            .join(VideoIdRules::render_name(&self.options.trim_format, identifier))
    }
}

#[async_trait]
impl BatchTask for CrawlInteractor {
    type Record = StatusRecord;

    fn name(&self) -> &'static str {
        "crawl"
    }

    async fn process(&self, row: &ManifestRow) -> StatusRecord {
        let identifier = row.identifier.as_str();
        if let Err(e) = VideoIdRules::validate(identifier) {
            return StatusRecord::failure(identifier, e.to_string());
        }

        let output = self.clip_path(identifier);
        if output.exists() {
            debug!(output = %output.display(), "Clip already exists");
            return StatusRecord::success(identifier, "Exists");
        }

        let operation = match self.options.policy.operation_for(row.start, row.end) {
            Ok(operation) => operation,
            Err(e) => return StatusRecord::failure(identifier, e.to_string()),
        };

        // Removed on drop, whatever happens below.
        let workdir = match tempfile::Builder::new()
            .prefix("okvideo-")
            .tempdir_in(&self.options.tmp_dir)
        {
            Ok(dir) => dir,
            Err(e) => {
                return StatusRecord::failure(
                    identifier,
                    format!(
                        "Failed to create scratch directory in {}: {}",
                        self.options.tmp_dir.display(),
                        e
                    ),
                )
            }
        };

        let downloaded = match self.fetch_port.fetch(identifier, workdir.path()).await {
            FetchOutcome::Downloaded(path) => path,
            FetchOutcome::Failed(message) => return StatusRecord::failure(identifier, message),
        };
        debug!(%operation, "Placing clip");

        let outcome = self
            .transform_port
            .clip(&ClipRequest {
                input: downloaded,
                output,
                operation,
            })
            .await;
        if outcome.success {
            info!(%operation, "Clip placed");
            StatusRecord::success(identifier, outcome.message)
        } else {
            StatusRecord::failure(identifier, outcome.message)
        }
    }

    fn failure(&self, row: &ManifestRow, reason: &str) -> StatusRecord {
        StatusRecord::failure(&row.identifier, reason)
    }
}
