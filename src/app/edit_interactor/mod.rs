// Edit interactor - Re-encodes manifest videos with user filters

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::app::batch::BatchTask;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Default edit filters
pub const DEFAULT_EDIT_FILTERS: &str = "-vf scale=320x240";

/// Options shared by every row of an edit run
#[derive(Debug, Clone)]
pub struct EditOptions {
    pub output_dir: PathBuf,
    pub root: Option<PathBuf>,
    pub filters: Vec<String>,
}

/// Interactor for the edit batch
pub struct EditInteractor {
    transform_port: Arc<dyn TransformPort>,
    options: EditOptions,
}

impl EditInteractor {
    /// Create new edit interactor with injected ports
    pub fn new(transform_port: Arc<dyn TransformPort>, options: EditOptions) -> Self {
        Self {
            transform_port,
            options,
        }
    }

    /// Output path mirroring the identifier's relative tree, extension kept
    pub fn output_path(&self, identifier: &str) -> PathBuf {
        self.options
            .output_dir
            .join(PathUtils::output_relative(self.options.root.as_deref(), identifier))
    }
}

#[async_trait]
impl BatchTask for EditInteractor {
    type Record = StatusRecord;

    fn name(&self) -> &'static str {
        "edit"
    }

    async fn process(&self, row: &ManifestRow) -> StatusRecord {
        let identifier = PathUtils::strip_extension(&row.identifier);
        let input = PathUtils::resolve_input(self.options.root.as_deref(), &row.identifier);
        let output = self.output_path(&row.identifier);

        if output.exists() {
            debug!(output = %output.display(), "Output already exists");
            return StatusRecord::success(identifier, "Exists");
        }
        if !input.is_file() {
            return StatusRecord::failure(identifier, "Unexistent file");
        }

        let outcome = self
            .transform_port
            .edit(&EditRequest {
                input,
                output,
                filters: self.options.filters.clone(),
            })
            .await;
        if outcome.success {
            StatusRecord::success(identifier, outcome.message)
        } else {
            StatusRecord::failure(identifier, outcome.message)
        }
    }

    fn failure(&self, row: &ManifestRow, reason: &str) -> StatusRecord {
        StatusRecord::failure(PathUtils::strip_extension(&row.identifier), reason)
    }
}
